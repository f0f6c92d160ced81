//! # Inspection Requests
//!
//! The immutable description of what a run should check. A request is built
//! once per command invocation and shared read-only by every job.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AuditError;

/// Base branch used when none is configured.
pub const DEFAULT_BASE_BRANCH: &str = "master";

/// Number of repositories inspected concurrently when none is configured.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Concurrency above this level tends to overwhelm remotes and local I/O.
pub const HIGH_CONCURRENCY_THRESHOLD: usize = 10;

/// Upper bound applied to the remote sync step.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// Which ancestry question a run answers.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  /// Has the branch been merged into the base branch?
  BranchIntoBase,
  /// Does the branch contain all of the base branch's history?
  BaseIntoBranch,
}

impl Direction {
  /// Short human description used in reports.
  pub fn describe(&self) -> &'static str {
    match self {
      Self::BranchIntoBase => "merged into",
      Self::BaseIntoBranch => "up to date with",
    }
  }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::BranchIntoBase => f.write_str("branch-into-base"),
      Self::BaseIntoBranch => f.write_str("base-into-branch"),
    }
  }
}

/// A validated, read-only inspection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionRequest {
  branch_ref: String,
  base_ref: String,
  sync_before_inspect: bool,
  concurrency_limit: NonZeroUsize,
  direction: Direction,
  sync_timeout: Duration,
  git_timeout: Option<Duration>,
}

impl InspectionRequest {
  /// Start building a request for `branch_ref`.
  pub fn builder(branch_ref: impl Into<String>) -> InspectionRequestBuilder {
    InspectionRequestBuilder::new(branch_ref)
  }

  /// The branch under test.
  pub fn branch_ref(&self) -> &str {
    &self.branch_ref
  }

  /// The reference branch the branch under test is compared against.
  pub fn base_ref(&self) -> &str {
    &self.base_ref
  }

  /// Whether remotes are fetched before resolving refs.
  pub fn sync_before_inspect(&self) -> bool {
    self.sync_before_inspect
  }

  /// Maximum number of repositories inspected at once.
  pub fn concurrency_limit(&self) -> usize {
    self.concurrency_limit.get()
  }

  pub fn direction(&self) -> Direction {
    self.direction
  }

  pub fn sync_timeout(&self) -> Duration {
    self.sync_timeout
  }

  /// Optional bound on ref resolution and ancestry evaluation.
  pub fn git_timeout(&self) -> Option<Duration> {
    self.git_timeout
  }
}

/// Builder for [`InspectionRequest`]; validation happens in [`build`].
///
/// [`build`]: InspectionRequestBuilder::build
#[derive(Debug, Clone)]
pub struct InspectionRequestBuilder {
  branch_ref: String,
  base_ref: String,
  sync_before_inspect: bool,
  concurrency_limit: usize,
  direction: Direction,
  sync_timeout: Duration,
  git_timeout: Option<Duration>,
}

impl InspectionRequestBuilder {
  fn new(branch_ref: impl Into<String>) -> Self {
    Self {
      branch_ref: branch_ref.into(),
      base_ref: DEFAULT_BASE_BRANCH.to_string(),
      sync_before_inspect: false,
      concurrency_limit: DEFAULT_CONCURRENCY,
      direction: Direction::BranchIntoBase,
      sync_timeout: DEFAULT_SYNC_TIMEOUT,
      git_timeout: None,
    }
  }

  pub fn base_ref(mut self, base_ref: impl Into<String>) -> Self {
    self.base_ref = base_ref.into();
    self
  }

  pub fn sync_before_inspect(mut self, sync: bool) -> Self {
    self.sync_before_inspect = sync;
    self
  }

  pub fn concurrency_limit(mut self, limit: usize) -> Self {
    self.concurrency_limit = limit;
    self
  }

  pub fn direction(mut self, direction: Direction) -> Self {
    self.direction = direction;
    self
  }

  pub fn sync_timeout(mut self, timeout: Duration) -> Self {
    self.sync_timeout = timeout;
    self
  }

  pub fn git_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.git_timeout = timeout;
    self
  }

  /// Validate and freeze the request.
  pub fn build(self) -> Result<InspectionRequest, AuditError> {
    let branch_ref = self.branch_ref.trim().to_string();
    if branch_ref.is_empty() {
      return Err(AuditError::EmptyRefName("branch"));
    }

    let base_ref = self.base_ref.trim().to_string();
    if base_ref.is_empty() {
      return Err(AuditError::EmptyRefName("base branch"));
    }

    let concurrency_limit =
      NonZeroUsize::new(self.concurrency_limit).ok_or(AuditError::InvalidConcurrency(self.concurrency_limit))?;

    if concurrency_limit.get() > HIGH_CONCURRENCY_THRESHOLD {
      warn!(
        limit = concurrency_limit.get(),
        "High concurrency may overwhelm remotes or local I/O"
      );
    }

    Ok(InspectionRequest {
      branch_ref,
      base_ref,
      sync_before_inspect: self.sync_before_inspect,
      concurrency_limit,
      direction: self.direction,
      sync_timeout: self.sync_timeout,
      git_timeout: self.git_timeout,
    })
  }
}
