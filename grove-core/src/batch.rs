//! # Batch Scheduling
//!
//! Runs inspections across a fleet in waves of at most
//! `concurrency_limit` repositories. A wave is fully awaited before the next
//! one starts, and results come back in discovery order.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::discovery::{RepositoryHandle, dedup_by_name, discover_repositories};
use crate::error::AuditError;
use crate::git::{Git2Sync, RemoteSync};
use crate::inspect::RepositoryInspector;
use crate::request::InspectionRequest;
use crate::result::InspectionResult;

/// Drives [`RepositoryInspector`] jobs over many repositories.
#[derive(Debug)]
pub struct BatchScheduler<S: RemoteSync = Git2Sync> {
  inspector: Arc<RepositoryInspector<S>>,
}

impl<S: RemoteSync> Clone for BatchScheduler<S> {
  fn clone(&self) -> Self {
    Self {
      inspector: Arc::clone(&self.inspector),
    }
  }
}

impl BatchScheduler<Git2Sync> {
  pub fn new() -> Self {
    Self::with_inspector(RepositoryInspector::new())
  }
}

impl Default for BatchScheduler<Git2Sync> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S: RemoteSync> BatchScheduler<S> {
  pub fn with_inspector(inspector: RepositoryInspector<S>) -> Self {
    Self {
      inspector: Arc::new(inspector),
    }
  }

  /// Inspect every repository in `repositories`.
  ///
  /// Handles sharing a name are inspected once, at their first position.
  /// `on_progress(completed, total)` is called once after each wave. An empty
  /// list returns immediately without calling it. Jobs that panic or are
  /// cancelled produce a result with a populated failure instead of
  /// disturbing their siblings.
  pub async fn run<F>(
    &self,
    repositories: Vec<RepositoryHandle>,
    request: &InspectionRequest,
    mut on_progress: F,
  ) -> Vec<InspectionResult>
  where
    F: FnMut(usize, usize),
  {
    let mut repositories = repositories;
    dedup_by_name(&mut repositories);

    let total = repositories.len();
    let limit = request.concurrency_limit();
    let mut results = Vec::with_capacity(total);

    if total == 0 {
      debug!("No repositories to inspect");
      return results;
    }

    info!(
      total,
      limit,
      branch = request.branch_ref(),
      base = request.base_ref(),
      direction = %request.direction(),
      "Starting inspection"
    );

    let shared_request = Arc::new(request.clone());

    for (wave, chunk) in repositories.chunks(limit).enumerate() {
      debug!(wave, size = chunk.len(), "Starting wave");

      let handles: Vec<(RepositoryHandle, JoinHandle<InspectionResult>)> = chunk
        .iter()
        .map(|repository| {
          let inspector = Arc::clone(&self.inspector);
          let request = Arc::clone(&shared_request);
          let job_repository = repository.clone();
          let handle = tokio::spawn(async move { inspector.inspect(&job_repository, &request).await });
          (repository.clone(), handle)
        })
        .collect();

      for (repository, handle) in handles {
        match handle.await {
          Ok(result) => results.push(result),
          Err(e) => {
            warn!(repo = %repository.name, error = %e, "Inspection task did not complete");
            results.push(InspectionResult::aborted(repository, request, e.to_string()));
          }
        }
      }

      on_progress(results.len(), total);
    }

    info!(total, "Inspection complete");
    results
  }

  /// Discover the repositories beneath `root` and inspect them.
  ///
  /// Discovery problems are fatal and are returned before any job starts.
  pub async fn run_root<P, F>(
    &self,
    root: P,
    request: &InspectionRequest,
    on_progress: F,
  ) -> Result<Vec<InspectionResult>, AuditError>
  where
    P: AsRef<Path>,
    F: FnMut(usize, usize),
  {
    let repositories = discover_repositories(root)?;
    Ok(self.run(repositories, request, on_progress).await)
  }
}

#[cfg(test)]
mod tests {
  use grove_test_utils::{FleetGuard, INITIAL_BRANCH, create_branch};

  use super::*;
  use crate::result::InspectionOutcome;

  fn request(limit: usize) -> InspectionRequest {
    InspectionRequest::builder("feature/x")
      .concurrency_limit(limit)
      .build()
      .unwrap()
  }

  #[tokio::test]
  async fn empty_fleet_produces_no_results_and_no_progress() {
    let mut calls = Vec::new();
    let results = BatchScheduler::new()
      .run(Vec::new(), &request(3), |done, total| calls.push((done, total)))
      .await;

    assert!(results.is_empty());
    assert!(calls.is_empty());
  }

  #[tokio::test]
  async fn progress_fires_once_per_wave() {
    let fleet = FleetGuard::new();
    for name in ["a", "b", "c", "d", "e"] {
      fleet.add_repo(name).unwrap();
    }

    let mut calls = Vec::new();
    let results = BatchScheduler::new()
      .run_root(fleet.root(), &request(2), |done, total| calls.push((done, total)))
      .await
      .unwrap();

    assert_eq!(results.len(), 5);
    assert_eq!(calls, vec![(2, 5), (4, 5), (5, 5)]);
  }

  #[tokio::test]
  async fn results_follow_discovery_order() {
    let fleet = FleetGuard::new();
    for name in ["delta", "alpha", "charlie", "bravo"] {
      let repo = fleet.add_repo(name).unwrap();
      if name != "charlie" {
        create_branch(&repo, "feature/x", Some(INITIAL_BRANCH)).unwrap();
      }
    }

    let results = BatchScheduler::new()
      .run_root(fleet.root(), &request(3), |_, _| {})
      .await
      .unwrap();

    let names: Vec<_> = results.iter().map(|result| result.repository.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "bravo", "charlie", "delta"]);
    assert_eq!(results[2].outcome(), InspectionOutcome::MissingBranch);
    assert_eq!(results[0].outcome(), InspectionOutcome::Satisfied);
  }

  #[tokio::test]
  async fn repeated_handles_are_inspected_once() {
    let fleet = FleetGuard::new();
    fleet.add_repo("alpha").unwrap();
    fleet.add_repo("bravo").unwrap();
    let alpha = RepositoryHandle::from_path(fleet.repo_path("alpha")).unwrap();
    let bravo = RepositoryHandle::from_path(fleet.repo_path("bravo")).unwrap();

    let mut calls = Vec::new();
    let results = BatchScheduler::new()
      .run(
        vec![alpha.clone(), bravo, alpha],
        &request(3),
        |done, total| calls.push((done, total)),
      )
      .await;

    let names: Vec<_> = results.iter().map(|result| result.repository.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "bravo"]);
    assert_eq!(calls, vec![(2, 2)]);
  }

  #[tokio::test]
  async fn missing_root_fails_before_any_job() {
    let fleet = FleetGuard::new();
    let mut calls = 0;
    let err = BatchScheduler::new()
      .run_root(fleet.root().join("absent"), &request(2), |_, _| calls += 1)
      .await
      .unwrap_err();

    assert!(matches!(err, AuditError::RootNotFound(_)));
    assert_eq!(calls, 0);
  }
}
