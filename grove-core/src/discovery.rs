//! # Repository Discovery
//!
//! Finds the working copies that make up a fleet. A fleet root is scanned one
//! level deep; nested repositories are never searched for.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::AuditError;
use crate::git::has_git_metadata;

/// A working copy taking part in an audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryHandle {
  /// Directory basename, used for display and deduplication.
  pub name: String,
  /// Absolute path to the working copy.
  pub path: PathBuf,
}

impl RepositoryHandle {
  /// Build a handle for an explicitly named working copy.
  pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
    let path = path.as_ref();
    if !has_git_metadata(path) {
      return Err(AuditError::NotARepository(path.to_path_buf()));
    }

    let path = fs::canonicalize(path).map_err(|source| AuditError::ReadRoot {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(Self::new(path))
  }

  fn new(path: PathBuf) -> Self {
    let name = path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());
    Self { name, path }
  }
}

/// List the repositories directly beneath `root`, sorted by name.
///
/// Entries without a `.git` directory or gitfile are skipped silently. The
/// root itself must exist and be a readable directory.
pub fn discover_repositories<P: AsRef<Path>>(root: P) -> Result<Vec<RepositoryHandle>, AuditError> {
  let root = root.as_ref();
  if !root.exists() {
    return Err(AuditError::RootNotFound(root.to_path_buf()));
  }
  if !root.is_dir() {
    return Err(AuditError::RootNotDirectory(root.to_path_buf()));
  }

  let read_err = |source| AuditError::ReadRoot {
    path: root.to_path_buf(),
    source,
  };
  let root = fs::canonicalize(root).map_err(read_err)?;

  let mut handles = Vec::new();
  for entry in fs::read_dir(&root).map_err(read_err)? {
    let path = entry.map_err(read_err)?.path();
    if !path.is_dir() {
      trace!(path = %path.display(), "Skipping non-directory entry");
      continue;
    }
    if !has_git_metadata(&path) {
      trace!(path = %path.display(), "Skipping directory without git metadata");
      continue;
    }
    handles.push(RepositoryHandle::new(path));
  }

  handles.sort_by(|a, b| a.name.cmp(&b.name));
  dedup_by_name(&mut handles);

  debug!(root = %root.display(), count = handles.len(), "Discovered repositories");
  Ok(handles)
}

/// Drop handles whose name was already seen, keeping the first occurrence.
pub fn dedup_by_name(handles: &mut Vec<RepositoryHandle>) {
  let mut seen = HashSet::new();
  handles.retain(|handle| {
    let first = seen.insert(handle.name.clone());
    if !first {
      debug!(repo = %handle.name, path = %handle.path.display(), "Skipping duplicate repository");
    }
    first
  });
}

#[cfg(test)]
mod tests {
  use grove_test_utils::FleetGuard;

  use super::*;

  #[test]
  fn discovers_only_repositories_in_name_order() {
    let fleet = FleetGuard::new();
    fleet.add_repo("charlie").unwrap();
    fleet.add_repo("alpha").unwrap();
    fleet.add_empty_repo("bravo").unwrap();
    fleet.add_plain_dir("docs").unwrap();
    fleet.add_file("notes.txt").unwrap();

    let handles = discover_repositories(fleet.root()).unwrap();
    let names: Vec<_> = handles.iter().map(|handle| handle.name.as_str()).collect();

    assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
    assert!(handles.iter().all(|handle| handle.path.is_absolute()));
  }

  #[test]
  fn empty_root_yields_no_repositories() {
    let fleet = FleetGuard::new();
    assert!(discover_repositories(fleet.root()).unwrap().is_empty());
  }

  #[test]
  fn nested_repositories_are_not_searched() {
    let fleet = FleetGuard::new();
    let group = fleet.add_plain_dir("group").unwrap();
    grove_test_utils::init_repository(&group.join("inner")).unwrap();

    assert!(discover_repositories(fleet.root()).unwrap().is_empty());
  }

  #[test]
  fn missing_root_is_fatal() {
    let fleet = FleetGuard::new();
    let err = discover_repositories(fleet.root().join("missing")).unwrap_err();
    assert!(matches!(err, AuditError::RootNotFound(_)));
  }

  #[test]
  fn file_root_is_fatal() {
    let fleet = FleetGuard::new();
    let file = fleet.add_file("root.txt").unwrap();
    let err = discover_repositories(&file).unwrap_err();
    assert!(matches!(err, AuditError::RootNotDirectory(_)));
  }

  #[test]
  fn explicit_path_must_be_a_repository() {
    let fleet = FleetGuard::new();
    fleet.add_repo("alpha").unwrap();
    let plain = fleet.add_plain_dir("plain").unwrap();

    let handle = RepositoryHandle::from_path(fleet.repo_path("alpha")).unwrap();
    assert_eq!(handle.name, "alpha");

    let err = RepositoryHandle::from_path(&plain).unwrap_err();
    assert!(matches!(err, AuditError::NotARepository(_)));
  }
}
