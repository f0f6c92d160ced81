//! # Config Command
//!
//! Prints the configuration file location and the defaults audits will use.

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use grove_core::AuditConfig;
use grove_core::config::{CONFIG_PATH_ENV, resolve_config_path};
use grove_core::output::{format_command, format_repo_path, print_header};

pub(crate) fn handle_config_command(config: &AuditConfig) -> Result<()> {
  let path = resolve_config_path(env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))?;
  let status = if path.exists() { "" } else { " (not found, using defaults)" };

  print_header("Configuration");
  println!(
    "  File: {}{status}",
    format_repo_path(&path.display().to_string())
  );
  println!(
    "  Override with {}",
    format_command(&format!("{CONFIG_PATH_ENV}=<path>"))
  );

  print_header("Audit defaults");
  println!(
    "  root_dir:          {}",
    format_repo_path(&config.root_dir().display().to_string())
  );
  println!("  base_branch:       {}", config.base_branch());
  println!("  concurrency:       {}", config.concurrency());
  println!("  sync_timeout_secs: {}", config.sync_timeout().as_secs());
  match config.git_timeout() {
    Some(timeout) => println!("  git_timeout_secs:  {}", timeout.as_secs()),
    None => println!("  git_timeout_secs:  none"),
  }

  Ok(())
}
