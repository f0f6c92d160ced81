//! # Error Types
//!
//! Two tiers of errors exist. [`AuditError`] covers pre-flight problems that
//! abort a whole run before any repository is touched. [`InspectionError`] and
//! [`SyncError`] describe problems confined to a single repository; they are
//! converted into data on the result record and never cross the scheduler.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::result::FailureStage;

/// Fatal errors raised before any inspection job starts.
#[derive(Debug, Error)]
pub enum AuditError {
  /// The fleet root directory does not exist.
  #[error("root directory does not exist: {}", .0.display())]
  RootNotFound(PathBuf),
  /// The fleet root exists but is not a directory.
  #[error("root path is not a directory: {}", .0.display())]
  RootNotDirectory(PathBuf),
  /// The fleet root (or one of its entries) could not be read.
  #[error("failed to read root directory {}: {source}", path.display())]
  ReadRoot {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  /// An explicitly listed path is not a git working copy.
  #[error("not a git repository: {}", .0.display())]
  NotARepository(PathBuf),
  /// The concurrency limit must be a positive integer.
  #[error("concurrency limit must be at least 1 (got {0})")]
  InvalidConcurrency(usize),
  /// A ref name was empty or whitespace.
  #[error("{0} name must not be empty")]
  EmptyRefName(&'static str),
}

/// Errors confined to the inspection of one repository.
#[derive(Debug, Error)]
pub enum InspectionError {
  #[error("failed to open repository at {}: {source}", path.display())]
  Open {
    path: PathBuf,
    #[source]
    source: git2::Error,
  },
  #[error("failed to resolve '{name}': {source}")]
  Resolve {
    name: String,
    #[source]
    source: git2::Error,
  },
  #[error("ancestry check failed: {0}")]
  Ancestry(#[source] git2::Error),
  #[error("failed to count commits between '{leading}' and '{lagging}': {source}")]
  Drift {
    lagging: String,
    leading: String,
    #[source]
    source: git2::Error,
  },
  #[error("inspection timed out after {}s", .0.as_secs_f64())]
  TimedOut(Duration),
  #[error("inspection task aborted: {0}")]
  Aborted(String),
}

impl InspectionError {
  /// The pipeline stage this error originated from.
  pub fn stage(&self) -> FailureStage {
    match self {
      Self::Open { .. } => FailureStage::Open,
      Self::Resolve { .. } => FailureStage::Resolve,
      Self::Ancestry(_) => FailureStage::Ancestry,
      Self::Drift { .. } => FailureStage::Drift,
      Self::TimedOut(_) => FailureStage::Timeout,
      Self::Aborted(_) => FailureStage::Aborted,
    }
  }
}

/// Errors from the optional remote synchronization step.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("failed to open repository at {}: {source}", path.display())]
  Open {
    path: PathBuf,
    #[source]
    source: git2::Error,
  },
  #[error("failed to fetch from remote '{remote}': {source}")]
  Remote {
    remote: String,
    #[source]
    source: git2::Error,
  },
  #[error("remote sync timed out after {}s", .0.as_secs_f64())]
  TimedOut(Duration),
  #[error("remote sync aborted: {0}")]
  Aborted(String),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn inspection_errors_map_to_stages() {
    let git_err = || git2::Error::from_str("boom");

    assert_eq!(
      InspectionError::Resolve {
        name: "main".into(),
        source: git_err(),
      }
      .stage(),
      FailureStage::Resolve
    );
    assert_eq!(InspectionError::Ancestry(git_err()).stage(), FailureStage::Ancestry);
    assert_eq!(
      InspectionError::TimedOut(Duration::from_secs(2)).stage(),
      FailureStage::Timeout
    );
    assert_eq!(InspectionError::Aborted("panic".into()).stage(), FailureStage::Aborted);
  }

  #[test]
  fn messages_keep_the_underlying_cause() {
    let err = InspectionError::Resolve {
      name: "feature/x".into(),
      source: git2::Error::from_str("corrupt loose reference"),
    };
    let message = err.to_string();
    assert!(message.contains("feature/x"));
    assert!(message.contains("corrupt loose reference"));
  }

  #[test]
  fn audit_errors_name_the_path() {
    let err = AuditError::RootNotFound(PathBuf::from("/no/such/fleet"));
    assert!(err.to_string().contains("/no/such/fleet"));
  }
}
