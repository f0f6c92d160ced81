//! # Configuration Management
//!
//! Locates and reads grove's configuration file. The file is optional and
//! read-only: every field falls back to a built-in default and command-line
//! flags override whatever the file says.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::request::{
  DEFAULT_BASE_BRANCH, DEFAULT_CONCURRENCY, DEFAULT_SYNC_TIMEOUT, InspectionRequest, InspectionRequestBuilder,
};

/// Environment variable that points at an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "GROVE_CONFIG";

/// Fleet root used when none is configured.
pub const DEFAULT_ROOT_DIR: &str = ".";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Represents the configuration directories for the grove application
#[derive(Debug, Clone)]
pub struct ConfigDirs {
  pub config_dir: PathBuf,
}

impl ConfigDirs {
  /// Create a new ConfigDirs instance
  pub fn new() -> Result<Self> {
    let proj_dirs = ProjectDirs::from("dev", "", "grove").context("Failed to determine project directories")?;

    Ok(Self {
      config_dir: proj_dirs.config_dir().to_path_buf(),
    })
  }

  /// Get the config directory
  pub fn config_dir(&self) -> &PathBuf {
    &self.config_dir
  }

  /// Get the path to the configuration file
  pub fn config_path(&self) -> PathBuf {
    self.config_dir.join(CONFIG_FILE_NAME)
  }
}

/// Get the configuration directories
pub fn get_config_dirs() -> Result<ConfigDirs> {
  ConfigDirs::new()
}

/// Pick the configuration file: an explicit override wins over the platform
/// default location.
pub fn resolve_config_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
  match override_path {
    Some(path) if !path.as_os_str().is_empty() => Ok(path),
    _ => Ok(get_config_dirs()?.config_path()),
  }
}

/// Defaults for audit runs, as read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
  /// Directory whose immediate children are the fleet's repositories.
  pub root_dir: Option<PathBuf>,
  pub base_branch: Option<String>,
  pub concurrency: Option<usize>,
  pub sync_timeout_secs: Option<u64>,
  /// Bound on ref resolution and ancestry per repository; unbounded if unset.
  pub git_timeout_secs: Option<u64>,
}

impl AuditConfig {
  /// Load the configuration from `$GROVE_CONFIG` or the platform config
  /// directory. A missing file yields the defaults.
  pub fn load() -> Result<Self> {
    let path = resolve_config_path(env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))?;
    Self::load_from(&path)
  }

  /// Load the configuration from `path`. A missing file yields the defaults.
  pub fn load_from(path: &Path) -> Result<Self> {
    if !path.exists() {
      debug!(path = %path.display(), "No configuration file, using defaults");
      return Ok(Self::default());
    }

    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: Self =
      toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))?;

    debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
  }

  pub fn root_dir(&self) -> PathBuf {
    self
      .root_dir
      .clone()
      .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_DIR))
  }

  pub fn base_branch(&self) -> &str {
    self.base_branch.as_deref().unwrap_or(DEFAULT_BASE_BRANCH)
  }

  pub fn concurrency(&self) -> usize {
    self.concurrency.unwrap_or(DEFAULT_CONCURRENCY)
  }

  pub fn sync_timeout(&self) -> Duration {
    self
      .sync_timeout_secs
      .map(Duration::from_secs)
      .unwrap_or(DEFAULT_SYNC_TIMEOUT)
  }

  pub fn git_timeout(&self) -> Option<Duration> {
    self.git_timeout_secs.map(Duration::from_secs)
  }

  /// Start an [`InspectionRequest`] for `branch` seeded with these defaults.
  pub fn request_builder(&self, branch: impl Into<String>) -> InspectionRequestBuilder {
    InspectionRequest::builder(branch)
      .base_ref(self.base_branch())
      .concurrency_limit(self.concurrency())
      .sync_timeout(self.sync_timeout())
      .git_timeout(self.git_timeout())
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_config_path_lives_in_config_dir() {
    let config_dirs = ConfigDirs::new().unwrap();
    let config_path = config_dirs.config_path();

    assert!(config_path.ends_with("config.toml"));
    assert!(config_path.starts_with(config_dirs.config_dir()));
  }

  #[test]
  fn test_override_path_wins() {
    let path = resolve_config_path(Some(PathBuf::from("/tmp/grove.toml"))).unwrap();
    assert_eq!(path, PathBuf::from("/tmp/grove.toml"));

    let fallback = resolve_config_path(Some(PathBuf::new())).unwrap();
    assert!(fallback.ends_with("config.toml"));
  }

  #[test]
  fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = AuditConfig::load_from(&temp_dir.path().join("config.toml")).unwrap();

    assert_eq!(config, AuditConfig::default());
    assert_eq!(config.root_dir(), PathBuf::from("."));
    assert_eq!(config.base_branch(), "master");
    assert_eq!(config.concurrency(), 5);
    assert_eq!(config.sync_timeout(), Duration::from_secs(30));
    assert_eq!(config.git_timeout(), None);
  }

  #[test]
  fn test_partial_file_keeps_other_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "base_branch = \"main\"\nconcurrency = 8\ngit_timeout_secs = 20\n").unwrap();

    let config = AuditConfig::load_from(&path).unwrap();

    assert_eq!(config.base_branch(), "main");
    assert_eq!(config.concurrency(), 8);
    assert_eq!(config.git_timeout(), Some(Duration::from_secs(20)));
    assert_eq!(config.sync_timeout(), Duration::from_secs(30));
  }

  #[test]
  fn test_unknown_keys_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "base = \"main\"\n").unwrap();

    let err = AuditConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
  }

  #[test]
  fn test_request_builder_uses_config_defaults() {
    let config = AuditConfig {
      base_branch: Some("develop".into()),
      concurrency: Some(2),
      sync_timeout_secs: Some(10),
      ..AuditConfig::default()
    };

    let request = config.request_builder("feature/x").build().unwrap();
    assert_eq!(request.base_ref(), "develop");
    assert_eq!(request.concurrency_limit(), 2);
    assert_eq!(request.sync_timeout(), Duration::from_secs(10));
    assert_eq!(request.git_timeout(), None);
  }
}
