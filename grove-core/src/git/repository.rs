//! Helpers for opening Git repositories.

use std::path::Path;

use git2::Repository;

use crate::error::{InspectionError, SyncError};

/// Open the working copy at exactly `path`, without searching parents.
pub fn open_repository(path: &Path) -> Result<Repository, InspectionError> {
  Repository::open(path).map_err(|source| InspectionError::Open {
    path: path.to_path_buf(),
    source,
  })
}

/// Same as [`open_repository`], reporting failures as a sync error.
pub(crate) fn open_for_sync(path: &Path) -> Result<Repository, SyncError> {
  Repository::open(path).map_err(|source| SyncError::Open {
    path: path.to_path_buf(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;
  use crate::result::FailureStage;

  #[test]
  fn open_reports_missing_repository() {
    let temp_dir = TempDir::new().unwrap();
    let Err(err) = open_repository(temp_dir.path()) else {
      panic!("expected open_repository to fail");
    };

    assert_eq!(err.stage(), FailureStage::Open);
    assert!(err.to_string().contains(&temp_dir.path().display().to_string()));
  }

  #[test]
  fn open_succeeds_for_initialized_repository() {
    let temp_dir = TempDir::new().unwrap();
    Repository::init(temp_dir.path()).unwrap();

    assert!(open_repository(temp_dir.path()).is_ok());
  }
}
