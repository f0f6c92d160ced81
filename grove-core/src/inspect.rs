//! # Repository Inspection
//!
//! Runs the full pipeline for one repository: optional remote sync, ref
//! resolution, ancestry, drift and merge-commit lookup. Every outcome,
//! including tool failures, ends up as data on an [`InspectionResult`].

use std::path::Path;
use std::pin::pin;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use git2::Repository;
use tokio::task;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::discovery::RepositoryHandle;
use crate::error::{InspectionError, SyncError};
use crate::git::{
  AncestryEvaluator, DEFAULT_MERGE_SEARCH_DEPTH, Git2Sync, RefResolver, RemoteSync, find_merge_commit, open_repository,
};
use crate::request::{Direction, InspectionRequest};
use crate::result::{InspectionFailure, InspectionResult, MergeCommit, ResolvedRef};

/// Inspects one repository at a time against an [`InspectionRequest`].
#[derive(Debug, Clone)]
pub struct RepositoryInspector<S: RemoteSync = Git2Sync> {
  sync: S,
  resolver: RefResolver,
  evaluator: AncestryEvaluator,
  merge_search_depth: usize,
}

impl RepositoryInspector<Git2Sync> {
  /// Inspector that fetches through libgit2.
  pub fn new() -> Self {
    Self::with_sync(Git2Sync)
  }
}

impl Default for RepositoryInspector<Git2Sync> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S: RemoteSync> RepositoryInspector<S> {
  /// Inspector using a custom remote synchronization strategy.
  pub fn with_sync(sync: S) -> Self {
    Self {
      sync,
      resolver: RefResolver::default(),
      evaluator: AncestryEvaluator::new(),
      merge_search_depth: DEFAULT_MERGE_SEARCH_DEPTH,
    }
  }

  pub fn with_resolver(mut self, resolver: RefResolver) -> Self {
    self.resolver = resolver;
    self
  }

  pub fn with_merge_search_depth(mut self, depth: usize) -> Self {
    self.merge_search_depth = depth;
    self
  }

  /// Inspect `repository`. Never fails: problems are recorded on the result.
  pub async fn inspect(&self, repository: &RepositoryHandle, request: &InspectionRequest) -> InspectionResult {
    let (sync_succeeded, sync_error) = if request.sync_before_inspect() {
      match self.sync_remotes(&repository.path, request.sync_timeout()).await {
        Ok(()) => (true, None),
        Err(e) => {
          warn!(repo = %repository.name, error = %e, "Remote sync failed, inspecting local state");
          (false, Some(e.to_string()))
        }
      }
    } else {
      (true, None)
    };

    let evaluation = self.evaluate(repository, request).await;
    if let Some(failure) = &evaluation.failure {
      warn!(repo = %repository.name, stage = ?failure.stage, "Inspection failed: {}", failure.message);
    }

    InspectionResult {
      repository: repository.clone(),
      direction: request.direction(),
      sync_succeeded,
      sync_error,
      branch_ref: evaluation.branch_ref,
      base_ref: evaluation.base_ref,
      is_ancestor_satisfied: evaluation.is_ancestor_satisfied,
      drift_count: evaluation.drift_count,
      commit_hash: evaluation.commit_hash,
      commit_timestamp: evaluation.commit_timestamp,
      merge_commit: evaluation.merge_commit,
      failure: evaluation.failure,
    }
  }

  /// Sync under `limit`. A sync that overruns gets a second window of the
  /// same length to wind down, so its network work stays inside the wave.
  async fn sync_remotes(&self, path: &Path, limit: Duration) -> Result<(), SyncError> {
    debug!(path = %path.display(), timeout_secs = limit.as_secs_f64(), "Syncing remotes");
    let mut sync = pin!(self.sync.sync(path, limit));

    match timeout(limit, &mut sync).await {
      Ok(result) => result,
      Err(_) => {
        if timeout(limit, &mut sync).await.is_err() {
          warn!(path = %path.display(), "Remote sync ignored its deadline, abandoning it");
        }
        Err(SyncError::TimedOut(limit))
      }
    }
  }

  async fn evaluate(&self, repository: &RepositoryHandle, request: &InspectionRequest) -> Evaluation {
    let path = repository.path.clone();
    let job_request = request.clone();
    let resolver = self.resolver.clone();
    let evaluator = self.evaluator;
    let depth = self.merge_search_depth;

    let blocking = async move {
      task::spawn_blocking(move || Evaluation::run(&path, &job_request, &resolver, evaluator, depth)).await
    };

    let joined = match request.git_timeout() {
      Some(limit) => match timeout(limit, blocking).await {
        Ok(joined) => joined,
        Err(_) => return Evaluation::failed(request, InspectionError::TimedOut(limit)),
      },
      None => blocking.await,
    };

    joined.unwrap_or_else(|e| Evaluation::failed(request, InspectionError::Aborted(e.to_string())))
  }
}

/// The repository-dependent part of a result, filled in stage by stage so a
/// failure keeps whatever was already learned.
#[derive(Debug)]
struct Evaluation {
  branch_ref: ResolvedRef,
  base_ref: ResolvedRef,
  is_ancestor_satisfied: bool,
  drift_count: u64,
  commit_hash: Option<String>,
  commit_timestamp: Option<DateTime<Utc>>,
  merge_commit: Option<MergeCommit>,
  failure: Option<InspectionFailure>,
}

impl Evaluation {
  fn empty(request: &InspectionRequest) -> Self {
    Self {
      branch_ref: ResolvedRef::absent(request.branch_ref()),
      base_ref: ResolvedRef::absent(request.base_ref()),
      is_ancestor_satisfied: false,
      drift_count: 0,
      commit_hash: None,
      commit_timestamp: None,
      merge_commit: None,
      failure: None,
    }
  }

  fn failed(request: &InspectionRequest, err: InspectionError) -> Self {
    let mut evaluation = Self::empty(request);
    evaluation.failure = Some(err.into());
    evaluation
  }

  fn run(
    path: &Path,
    request: &InspectionRequest,
    resolver: &RefResolver,
    evaluator: AncestryEvaluator,
    merge_search_depth: usize,
  ) -> Self {
    let mut evaluation = Self::empty(request);
    if let Err(err) = evaluation.fill(path, request, resolver, evaluator, merge_search_depth) {
      evaluation.is_ancestor_satisfied = false;
      evaluation.drift_count = 0;
      evaluation.failure = Some(err.into());
    }
    evaluation
  }

  fn fill(
    &mut self,
    path: &Path,
    request: &InspectionRequest,
    resolver: &RefResolver,
    evaluator: AncestryEvaluator,
    merge_search_depth: usize,
  ) -> Result<(), InspectionError> {
    let repo = open_repository(path)?;

    self.base_ref = resolver.resolve_in(&repo, request.base_ref())?;
    self.branch_ref = resolver.resolve_in(&repo, request.branch_ref())?;

    let (Some(branch_tip), Some(base_tip)) = (self.branch_ref.commit_id(), self.base_ref.commit_id()) else {
      debug!(
        path = %path.display(),
        branch_exists = self.branch_ref.exists,
        base_exists = self.base_ref.exists,
        "Skipping ancestry, a ref is missing"
      );
      return Ok(());
    };

    self.record_branch_tip(&repo, request.branch_ref(), branch_tip)?;

    let branch_reference = qualified_name(&self.branch_ref);
    let base_reference = qualified_name(&self.base_ref);

    match request.direction() {
      Direction::BranchIntoBase => {
        self.is_ancestor_satisfied = evaluator.is_ancestor_in(&repo, branch_tip, base_tip)?;
        if !self.is_ancestor_satisfied {
          self.drift_count = evaluator.count_behind_in(&repo, base_reference, branch_reference)?;
        }

        match find_merge_commit(&repo, base_tip, request.branch_ref(), merge_search_depth) {
          Ok(found) => self.merge_commit = found,
          Err(e) => debug!(path = %path.display(), error = %e, "Merge commit lookup failed"),
        }
      }
      Direction::BaseIntoBranch => {
        self.is_ancestor_satisfied = evaluator.is_ancestor_in(&repo, base_tip, branch_tip)?;
        if !self.is_ancestor_satisfied {
          self.drift_count = evaluator.count_behind_in(&repo, branch_reference, base_reference)?;
        }
      }
    }

    debug!(
      path = %path.display(),
      satisfied = self.is_ancestor_satisfied,
      drift = self.drift_count,
      "Evaluated ancestry"
    );
    Ok(())
  }

  fn record_branch_tip(&mut self, repo: &Repository, name: &str, tip: git2::Oid) -> Result<(), InspectionError> {
    let commit = repo.find_commit(tip).map_err(|source| InspectionError::Resolve {
      name: name.to_string(),
      source,
    })?;

    self.commit_hash = Some(commit.id().to_string());
    self.commit_timestamp = Utc.timestamp_opt(commit.time().seconds(), 0).single();
    Ok(())
  }
}

fn qualified_name(resolved: &ResolvedRef) -> &str {
  resolved.reference.as_deref().unwrap_or(&resolved.requested_name)
}
