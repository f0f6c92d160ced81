//! Ref resolution with ordered fallback strategies.
//!
//! Contributors frequently work from branches that only exist as
//! remote-tracking refs, so a name is looked up as a local branch first and as
//! `origin/<name>` second. The strategies form an ordered list evaluated until
//! the first hit; adding another remote means appending to that list.

use std::path::Path;

use git2::{ErrorCode, Repository};
use serde::Serialize;
use tracing::{debug, trace};

use super::repository::open_repository;
use crate::error::InspectionError;
use crate::result::ResolvedRef;

/// Remote consulted by the default fallback strategy.
pub const DEFAULT_REMOTE: &str = "origin";

/// One way of turning a short branch name into a fully qualified reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefStrategy {
  /// `refs/heads/<name>`
  LocalBranch,
  /// `refs/remotes/<remote>/<name>`
  RemoteTracking { remote: String },
}

impl RefStrategy {
  /// Remote-tracking strategy for the given remote.
  pub fn remote(remote: impl Into<String>) -> Self {
    Self::RemoteTracking { remote: remote.into() }
  }

  /// The fully qualified reference this strategy looks up for `name`.
  pub fn reference_name(&self, name: &str) -> String {
    match self {
      Self::LocalBranch => format!("refs/heads/{name}"),
      Self::RemoteTracking { remote } => format!("refs/remotes/{remote}/{name}"),
    }
  }

  /// The short form shown to operators (`name` or `<remote>/name`).
  pub fn short_name(&self, name: &str) -> String {
    match self {
      Self::LocalBranch => name.to_string(),
      Self::RemoteTracking { remote } => format!("{remote}/{name}"),
    }
  }
}

/// Resolves human-supplied branch names to commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefResolver {
  strategies: Vec<RefStrategy>,
}

impl Default for RefResolver {
  fn default() -> Self {
    Self {
      strategies: vec![RefStrategy::LocalBranch, RefStrategy::remote(DEFAULT_REMOTE)],
    }
  }
}

impl RefResolver {
  pub fn new() -> Self {
    Self::default()
  }

  /// Use a custom, ordered list of strategies.
  pub fn with_strategies(strategies: Vec<RefStrategy>) -> Self {
    Self { strategies }
  }

  /// Resolve `ref_name` in the repository at `repository_path`.
  ///
  /// A ref that no strategy finds is reported with `exists == false`; only
  /// tool-level problems (unreadable or corrupt refs) are errors.
  pub fn resolve(&self, repository_path: &Path, ref_name: &str) -> Result<ResolvedRef, InspectionError> {
    let repo = open_repository(repository_path)?;
    self.resolve_in(&repo, ref_name)
  }

  /// Resolve `ref_name` against an already opened repository.
  pub fn resolve_in(&self, repo: &Repository, ref_name: &str) -> Result<ResolvedRef, InspectionError> {
    let resolve_err = |source| InspectionError::Resolve {
      name: ref_name.to_string(),
      source,
    };

    for strategy in &self.strategies {
      let reference_name = strategy.reference_name(ref_name);

      let reference = match repo.find_reference(&reference_name) {
        Ok(reference) => reference,
        Err(e) if is_absent(&e) => {
          trace!(reference = %reference_name, "Reference not found, trying next strategy");
          continue;
        }
        Err(e) => return Err(resolve_err(e)),
      };

      let commit = reference.peel_to_commit().map_err(resolve_err)?;
      debug!(
        requested = ref_name,
        resolved = %reference_name,
        commit = %commit.id(),
        "Resolved reference"
      );
      return Ok(ResolvedRef::found(ref_name, strategy, commit.id()));
    }

    debug!(requested = ref_name, "Reference does not exist locally or remotely");
    Ok(ResolvedRef::absent(ref_name))
  }
}

/// Lookup failures that mean "no such ref" rather than "could not look".
fn is_absent(err: &git2::Error) -> bool {
  matches!(err.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec)
}
