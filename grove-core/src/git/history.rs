//! Merge commit lookup on a base branch's history.

use chrono::{TimeZone, Utc};
use git2::{Commit, Oid, Repository};
use tracing::trace;

use crate::result::MergeCommit;

/// How many first-parent commits of the base branch are inspected.
pub const DEFAULT_MERGE_SEARCH_DEPTH: usize = 500;

/// Walk the first-parent history of `base_tip` and return the most recent
/// merge commit whose message mentions `branch_name`.
///
/// Only the first `max_depth` commits are examined.
pub fn find_merge_commit(
  repo: &Repository,
  base_tip: Oid,
  branch_name: &str,
  max_depth: usize,
) -> Result<Option<MergeCommit>, git2::Error> {
  let mut revwalk = repo.revwalk()?;
  revwalk.push(base_tip)?;
  revwalk.simplify_first_parent()?;

  for oid in revwalk.take(max_depth) {
    let commit = repo.find_commit(oid?)?;
    if commit.parent_count() < 2 {
      continue;
    }

    let message = commit.message().unwrap_or_default();
    if mentions_branch(message, branch_name) {
      trace!(commit = %commit.id(), branch = branch_name, "Found merge commit");
      return Ok(Some(merge_commit_record(&commit)));
    }
  }

  Ok(None)
}

/// Whether `message` names `branch_name` as a whole token.
///
/// `feature/x` must not match inside `feature/x2` or `myfeature/x`.
pub fn mentions_branch(message: &str, branch_name: &str) -> bool {
  if branch_name.is_empty() {
    return false;
  }

  let is_name_char = |c: char| c.is_alphanumeric() || matches!(c, '-' | '_' | '/' | '.');

  message.match_indices(branch_name).any(|(start, _)| {
    // `owner/branch` as written by pull request merges still counts
    let before_ok = message[..start]
      .chars()
      .next_back()
      .is_none_or(|c| c == '/' || !is_name_char(c));

    let after = &message[start + branch_name.len()..];
    let after_ok = match after.chars().next() {
      None => true,
      Some('.') => after[1..].chars().next().is_none_or(char::is_whitespace),
      Some(c) => !is_name_char(c),
    };

    before_ok && after_ok
  })
}

fn merge_commit_record(commit: &Commit<'_>) -> MergeCommit {
  MergeCommit {
    hash: commit.id().to_string(),
    summary: commit.summary().map(str::to_string),
    timestamp: Utc.timestamp_opt(commit.time().seconds(), 0).single(),
  }
}
