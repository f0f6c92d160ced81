//! Fleet fixtures for testing
//!
//! A fleet is a root directory whose immediate children are independently
//! initialized repositories, mirroring how an operator lays out their clones.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use git2::Repository;
use tempfile::TempDir;

use crate::git::{create_commit, init_repository};

/// A temporary fleet root. Everything beneath it is removed on drop.
pub struct FleetGuard {
  /// The temporary directory acting as the fleet root
  pub temp_dir: TempDir,
}

impl FleetGuard {
  /// Create an empty fleet root
  pub fn new() -> Self {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    Self { temp_dir }
  }

  /// Get the fleet root path
  pub fn root(&self) -> &Path {
    self.temp_dir.path()
  }

  /// Get the path a member repository named `name` lives at
  pub fn repo_path(&self, name: &str) -> PathBuf {
    self.root().join(name)
  }

  /// Initialize a member repository with a single initial commit on
  /// `master`
  pub fn add_repo(&self, name: &str) -> Result<Repository> {
    let path = self.repo_path(name);
    fs::create_dir_all(&path)?;
    let repo = init_repository(&path)?;
    create_commit(&repo, "README.md", &format!("# {name}\n"), "Initial commit")?;
    Ok(repo)
  }

  /// Initialize a member repository with no commits at all
  pub fn add_empty_repo(&self, name: &str) -> Result<Repository> {
    let path = self.repo_path(name);
    fs::create_dir_all(&path)?;
    init_repository(&path)
  }

  /// Create a plain directory that is not a repository
  pub fn add_plain_dir(&self, name: &str) -> Result<PathBuf> {
    let path = self.repo_path(name);
    fs::create_dir_all(&path)?;
    fs::write(path.join("notes.txt"), "not a repository\n")?;
    Ok(path)
  }

  /// Create a plain file directly under the root
  pub fn add_file(&self, name: &str) -> Result<PathBuf> {
    let path = self.repo_path(name);
    fs::write(&path, "stray file\n")?;
    Ok(path)
  }
}

impl Default for FleetGuard {
  fn default() -> Self {
    Self::new()
  }
}
