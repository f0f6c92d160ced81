//! Repository detection helpers.

use std::path::Path;

/// Name of the version-control metadata entry inside a working copy.
pub const GIT_METADATA_ENTRY: &str = ".git";

/// Check whether `path` is a working copy root.
///
/// A `.git` directory marks a regular clone; a `.git` file marks a linked
/// worktree or submodule checkout. Parent directories are never consulted.
pub fn has_git_metadata<P: AsRef<Path>>(path: P) -> bool {
  let metadata = path.as_ref().join(GIT_METADATA_ENTRY);
  metadata.is_dir() || metadata.is_file()
}

#[cfg(test)]
mod tests {
  use std::fs;

  use git2::Repository as GitRepository;
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn plain_directory_is_not_a_repository() {
    let temp_dir = TempDir::new().unwrap();
    assert!(!has_git_metadata(temp_dir.path()));
  }

  #[test]
  fn initialized_directory_is_a_repository() {
    let temp_dir = TempDir::new().unwrap();
    GitRepository::init(temp_dir.path()).unwrap();
    assert!(has_git_metadata(temp_dir.path()));
  }

  #[test]
  fn gitfile_marks_a_repository() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".git"), "gitdir: /elsewhere/.git/worktrees/x\n").unwrap();
    assert!(has_git_metadata(temp_dir.path()));
  }

  #[test]
  fn nested_directory_does_not_inherit_parent_repository() {
    let temp_dir = TempDir::new().unwrap();
    GitRepository::init(temp_dir.path()).unwrap();
    let nested = temp_dir.path().join("nested");
    fs::create_dir_all(&nested).unwrap();

    assert!(!has_git_metadata(&nested));
  }
}
