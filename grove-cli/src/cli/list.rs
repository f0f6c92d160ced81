//! # List Command
//!
//! Shows the repositories an audit would visit, in visiting order.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use grove_core::output::{format_repo_name, format_repo_path};
use grove_core::{AuditConfig, discover_repositories, print_info, print_warning};

use crate::report::OutputFormat;

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
  /// Directory whose immediate children are the repositories
  #[arg(long, short = 'r', value_name = "PATH")]
  pub root: Option<PathBuf>,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  pub format: OutputFormat,
}

pub(crate) fn handle_list_command(args: ListArgs, config: &AuditConfig) -> Result<()> {
  let root = args.root.unwrap_or_else(|| config.root_dir());
  let repositories = discover_repositories(&root)?;

  if args.format == OutputFormat::Json {
    let json = serde_json::to_string_pretty(&repositories).context("Failed to serialize repository list")?;
    println!("{json}");
    return Ok(());
  }

  if repositories.is_empty() {
    print_warning(&format!(
      "No repositories found under {}",
      format_repo_path(&root.display().to_string())
    ));
    return Ok(());
  }

  print_info(&format!(
    "{} repositories under {}",
    repositories.len(),
    format_repo_path(&root.display().to_string())
  ));
  for repository in &repositories {
    println!(
      "  {:<24} {}",
      format_repo_name(&repository.name),
      format_repo_path(&repository.path.display().to_string())
    );
  }

  Ok(())
}
