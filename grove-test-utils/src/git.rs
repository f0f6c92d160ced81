//! Git repository management for testing
//!
//! This module provides utilities for creating temporary git repositories and
//! shaping their history (commits, branches, merges, remote-tracking refs).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use git2::{BranchType, Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// Branch every test repository starts on, independent of the host's
/// `init.defaultBranch` setting.
pub const INITIAL_BRANCH: &str = "master";

/// A test guard that owns a temporary git repository. The directory is removed
/// when the guard is dropped.
pub struct GitRepoTestGuard {
  /// The temporary directory containing the git repository
  pub temp_dir: TempDir,
  /// The git repository
  pub repo: Repository,
}

impl GitRepoTestGuard {
  /// Create a new test git repository
  pub fn new() -> Self {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let repo = init_repository(temp_dir.path()).expect("Failed to initialize git repository");

    assert!(
      temp_dir.path().join(".git").exists(),
      "Git repository was not properly initialized"
    );

    Self { temp_dir, repo }
  }

  /// Get the path to the git repository
  pub fn path(&self) -> &Path {
    self.temp_dir.path()
  }
}

impl Default for GitRepoTestGuard {
  fn default() -> Self {
    Self::new()
  }
}

/// Initialize a non-bare repository at `path` on [`INITIAL_BRANCH`] with a
/// test identity configured.
pub fn init_repository(path: &Path) -> Result<Repository> {
  let mut opts = RepositoryInitOptions::new();
  opts.initial_head(INITIAL_BRANCH);
  let repo = Repository::init_opts(path, &opts)?;

  {
    let mut config = repo.config()?;
    config.set_str("user.name", "Grove Test User")?;
    config.set_str("user.email", "grove-test@example.com")?;
  }

  Ok(repo)
}

/// Helper function to create a commit on HEAD, returning its id
pub fn create_commit(repo: &Repository, file_name: &str, content: &str, message: &str) -> Result<Oid> {
  let workdir = repo.workdir().context("repository has no working directory")?;
  fs::write(workdir.join(file_name), content)?;

  let mut index = repo.index()?;
  index.add_path(Path::new(file_name))?;
  index.write()?;

  let tree_id = index.write_tree()?;
  let tree = repo.find_tree(tree_id)?;
  let signature = Signature::now("Test User", "test@example.com")?;

  let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
  let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

  let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
  Ok(oid)
}

/// Create `count` sequential commits on HEAD, each touching its own file
pub fn create_commits(repo: &Repository, prefix: &str, count: usize) -> Result<Oid> {
  let mut last = None;
  for i in 0..count {
    let file_name = format!("{prefix}-{i}.txt");
    last = Some(create_commit(repo, &file_name, &format!("{prefix} {i}\n"), &format!("{prefix} commit {i}"))?);
  }
  last.context("create_commits requires count > 0")
}

/// Helper function to create a branch in a repository
pub fn create_branch(repo: &Repository, branch_name: &str, start_point: Option<&str>) -> Result<()> {
  let head = if let Some(start) = start_point {
    repo
      .find_branch(start, BranchType::Local)?
      .into_reference()
      .peel_to_commit()?
  } else {
    repo.head()?.peel_to_commit()?
  };

  repo.branch(branch_name, &head, false)?;
  Ok(())
}

/// Helper function to checkout a branch
pub fn checkout_branch(repo: &Repository, branch_name: &str) -> Result<()> {
  let obj = repo
    .revparse_single(&format!("refs/heads/{branch_name}"))?
    .peel_to_commit()?;

  repo.checkout_tree(
    obj.as_object(),
    Some(git2::build::CheckoutBuilder::new().force()),
  )?;
  repo.set_head(&format!("refs/heads/{branch_name}"))?;

  Ok(())
}

/// Create a two-parent merge commit on HEAD that brings in `branch_name`.
///
/// The resulting tree is HEAD's tree; tests only care about the commit graph.
pub fn create_merge_commit(repo: &Repository, branch_name: &str, message: &str) -> Result<Oid> {
  let head = repo.head()?.peel_to_commit()?;
  let other = repo
    .find_branch(branch_name, BranchType::Local)?
    .into_reference()
    .peel_to_commit()?;
  let tree = head.tree()?;
  let signature = Signature::now("Test User", "test@example.com")?;

  let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[&head, &other])?;
  Ok(oid)
}

/// Point `refs/remotes/<remote>/<branch>` at `target` without any network
/// activity.
pub fn set_remote_tracking_ref(repo: &Repository, remote: &str, branch: &str, target: Oid) -> Result<()> {
  repo.reference(
    &format!("refs/remotes/{remote}/{branch}"),
    target,
    true,
    "grove test: remote-tracking ref",
  )?;
  Ok(())
}

/// Delete a local branch
pub fn delete_branch(repo: &Repository, branch_name: &str) -> Result<()> {
  repo.find_branch(branch_name, BranchType::Local)?.delete()?;
  Ok(())
}

/// Register a remote named `name` pointing at `url`
pub fn add_remote(repo: &Repository, name: &str, url: &str) -> Result<()> {
  repo.remote(name, url)?;
  Ok(())
}

/// Resolve a branch tip to its commit id
pub fn branch_tip(repo: &Repository, branch_name: &str) -> Result<Oid> {
  let oid = repo
    .find_branch(branch_name, BranchType::Local)?
    .into_reference()
    .peel_to_commit()?
    .id();
  Ok(oid)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_creates_git_repo() {
    let git_repo = GitRepoTestGuard::new();
    assert!(git_repo.path().join(".git").exists());
  }

  #[test]
  fn test_initial_branch_is_pinned() {
    let git_repo = GitRepoTestGuard::new();
    create_commit(&git_repo.repo, "README.md", "hello", "initial").unwrap();

    let head = git_repo.repo.head().unwrap();
    assert_eq!(head.shorthand(), Some(INITIAL_BRANCH));
  }

  #[test]
  fn test_create_commits_builds_linear_history() {
    let git_repo = GitRepoTestGuard::new();
    let repo = &git_repo.repo;
    let first = create_commit(repo, "README.md", "hello", "initial").unwrap();
    let last = create_commits(repo, "work", 3).unwrap();

    let (ahead, behind) = repo.graph_ahead_behind(last, first).unwrap();
    assert_eq!((ahead, behind), (3, 0));
  }

  #[test]
  fn test_merge_commit_has_two_parents() {
    let git_repo = GitRepoTestGuard::new();
    let repo = &git_repo.repo;
    create_commit(repo, "README.md", "hello", "initial").unwrap();
    create_branch(repo, "feature", None).unwrap();
    checkout_branch(repo, "feature").unwrap();
    create_commit(repo, "feature.txt", "feature", "feature work").unwrap();
    checkout_branch(repo, INITIAL_BRANCH).unwrap();

    let merge = create_merge_commit(repo, "feature", "Merge branch 'feature'").unwrap();
    assert_eq!(repo.find_commit(merge).unwrap().parent_count(), 2);
  }

  #[test]
  fn test_remote_tracking_ref_is_created() {
    let git_repo = GitRepoTestGuard::new();
    let repo = &git_repo.repo;
    let oid = create_commit(repo, "README.md", "hello", "initial").unwrap();

    set_remote_tracking_ref(repo, "origin", "feature/y", oid).unwrap();
    assert!(repo.find_branch("origin/feature/y", BranchType::Remote).is_ok());
  }
}
