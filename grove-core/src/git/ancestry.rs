//! Ancestry and drift computation.
//!
//! A single primitive answers both audit questions: "branch merged into base"
//! holds when the branch commit is an ancestor of the base commit, and
//! "branch up to date with base" holds when the base commit is an ancestor of
//! the branch commit. Nothing here writes to the repository.

use std::path::Path;

use git2::{Oid, Repository};
use tracing::trace;

use super::repository::open_repository;
use crate::error::InspectionError;

/// Answers ancestry questions about commits in one repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct AncestryEvaluator;

impl AncestryEvaluator {
  pub fn new() -> Self {
    Self
  }

  /// Whether every change reachable from `candidate` is already reachable
  /// from `descendant`. A commit is its own ancestor.
  pub fn is_ancestor(&self, repository_path: &Path, candidate: Oid, descendant: Oid) -> Result<bool, InspectionError> {
    let repo = open_repository(repository_path)?;
    self.is_ancestor_in(&repo, candidate, descendant)
  }

  pub fn is_ancestor_in(&self, repo: &Repository, candidate: Oid, descendant: Oid) -> Result<bool, InspectionError> {
    if candidate == descendant {
      return Ok(true);
    }

    let verdict = repo
      .graph_descendant_of(descendant, candidate)
      .map_err(InspectionError::Ancestry)?;
    trace!(%candidate, %descendant, verdict, "Ancestry check");
    Ok(verdict)
  }

  /// Count commits reachable from `leading_ref` but not from `lagging_ref`.
  ///
  /// Both arguments are rev-parse expressions; callers pass the resolved
  /// (fully qualified) names so a tag sharing a branch's name cannot shadow it.
  pub fn count_behind(
    &self,
    repository_path: &Path,
    lagging_ref: &str,
    leading_ref: &str,
  ) -> Result<u64, InspectionError> {
    let repo = open_repository(repository_path)?;
    self.count_behind_in(&repo, lagging_ref, leading_ref)
  }

  pub fn count_behind_in(
    &self,
    repo: &Repository,
    lagging_ref: &str,
    leading_ref: &str,
  ) -> Result<u64, InspectionError> {
    let drift_err = |source| InspectionError::Drift {
      lagging: lagging_ref.to_string(),
      leading: leading_ref.to_string(),
      source,
    };

    let lagging = repo
      .revparse_single(lagging_ref)
      .and_then(|object| object.peel_to_commit())
      .map_err(drift_err)?;
    let leading = repo
      .revparse_single(leading_ref)
      .and_then(|object| object.peel_to_commit())
      .map_err(drift_err)?;

    let (ahead, _behind) = repo.graph_ahead_behind(leading.id(), lagging.id()).map_err(drift_err)?;
    Ok(ahead as u64)
  }
}
