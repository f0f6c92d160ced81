//! # Inspection Results
//!
//! Pure data records produced by the inspection engine. Every field a report
//! needs is already computed, so downstream formatters only partition and
//! print.

use chrono::{DateTime, Utc};
use git2::Oid;
use serde::Serialize;

use crate::discovery::RepositoryHandle;
use crate::error::InspectionError;
use crate::git::refs::RefStrategy;
use crate::request::{Direction, InspectionRequest};

/// Outcome of resolving one human-supplied ref name in one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRef {
  /// The name the operator asked for.
  pub requested_name: String,
  /// The short name that actually resolved (e.g. `origin/feature/x`).
  pub resolved_name: Option<String>,
  /// The fully qualified reference that resolved.
  pub reference: Option<String>,
  pub exists: bool,
  pub commit_hash: Option<String>,
  /// The strategy that produced the match.
  pub source: Option<RefStrategy>,
}

impl ResolvedRef {
  /// A ref that could not be found by any strategy.
  pub fn absent(requested_name: impl Into<String>) -> Self {
    Self {
      requested_name: requested_name.into(),
      resolved_name: None,
      reference: None,
      exists: false,
      commit_hash: None,
      source: None,
    }
  }

  pub(crate) fn found(requested_name: &str, strategy: &RefStrategy, commit: Oid) -> Self {
    Self {
      requested_name: requested_name.to_string(),
      resolved_name: Some(strategy.short_name(requested_name)),
      reference: Some(strategy.reference_name(requested_name)),
      exists: true,
      commit_hash: Some(commit.to_string()),
      source: Some(strategy.clone()),
    }
  }

  /// The commit this ref points at, if it resolved.
  pub fn commit_id(&self) -> Option<Oid> {
    self.commit_hash.as_deref().and_then(|hash| Oid::from_str(hash).ok())
  }

  /// The name to show an operator: the resolved form when available.
  pub fn display_name(&self) -> &str {
    self.resolved_name.as_deref().unwrap_or(&self.requested_name)
  }

  /// Whether resolution fell back to a remote-tracking branch.
  pub fn is_remote_fallback(&self) -> bool {
    matches!(self.source, Some(RefStrategy::RemoteTracking { .. }))
  }
}

/// Pipeline stage a per-repository failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
  Open,
  Resolve,
  Ancestry,
  Drift,
  Timeout,
  Aborted,
}

/// A processing failure recorded on a result instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionFailure {
  pub stage: FailureStage,
  pub message: String,
}

impl From<&InspectionError> for InspectionFailure {
  fn from(err: &InspectionError) -> Self {
    Self {
      stage: err.stage(),
      message: err.to_string(),
    }
  }
}

impl From<InspectionError> for InspectionFailure {
  fn from(err: InspectionError) -> Self {
    Self::from(&err)
  }
}

/// A merge commit on the base branch that mentions the branch under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeCommit {
  pub hash: String,
  pub summary: Option<String>,
  pub timestamp: Option<DateTime<Utc>>,
}

/// Per-repository outcome of one inspection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionResult {
  pub repository: RepositoryHandle,
  pub direction: Direction,
  pub sync_succeeded: bool,
  pub sync_error: Option<String>,
  pub branch_ref: ResolvedRef,
  pub base_ref: ResolvedRef,
  /// Only meaningful when both refs exist; false otherwise.
  pub is_ancestor_satisfied: bool,
  /// Commits the lagging ref is behind; 0 when satisfied or not computed.
  pub drift_count: u64,
  /// Tip of the resolved branch ref.
  pub commit_hash: Option<String>,
  pub commit_timestamp: Option<DateTime<Utc>>,
  pub merge_commit: Option<MergeCommit>,
  pub failure: Option<InspectionFailure>,
}

/// Mutually exclusive classification of a result, in reporting priority
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InspectionOutcome {
  Satisfied,
  Behind { drift: u64 },
  MissingBranch,
  MissingBase,
  Errored,
}

impl InspectionResult {
  /// Classify the record. Failures win over everything, then absence, then
  /// the ancestry verdict.
  pub fn outcome(&self) -> InspectionOutcome {
    if self.failure.is_some() {
      InspectionOutcome::Errored
    } else if !self.branch_ref.exists {
      InspectionOutcome::MissingBranch
    } else if !self.base_ref.exists {
      InspectionOutcome::MissingBase
    } else if self.is_ancestor_satisfied {
      InspectionOutcome::Satisfied
    } else {
      InspectionOutcome::Behind {
        drift: self.drift_count,
      }
    }
  }

  /// Both refs resolved, so the satisfaction flag carries a verdict.
  pub fn has_verdict(&self) -> bool {
    self.failure.is_none() && self.branch_ref.exists && self.base_ref.exists
  }

  /// Record for a job that never produced its own result (panic or
  /// cancellation).
  pub(crate) fn aborted(repository: RepositoryHandle, request: &InspectionRequest, reason: String) -> Self {
    let failure = InspectionFailure::from(InspectionError::Aborted(reason));
    Self {
      repository,
      direction: request.direction(),
      sync_succeeded: !request.sync_before_inspect(),
      sync_error: None,
      branch_ref: ResolvedRef::absent(request.branch_ref()),
      base_ref: ResolvedRef::absent(request.base_ref()),
      is_ancestor_satisfied: false,
      drift_count: 0,
      commit_hash: None,
      commit_timestamp: None,
      merge_commit: None,
      failure: Some(failure),
    }
  }
}
