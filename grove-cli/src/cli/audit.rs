//! # Audit Commands
//!
//! Shared implementation of `grove merged` and `grove contains`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use grove_core::git::configure_transport_timeouts;
use grove_core::output::format_repo_path;
use grove_core::{AuditConfig, BatchScheduler, Direction, RepositoryHandle, discover_repositories, print_warning};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::consts::{PROGRESS_CHARS, PROGRESS_TEMPLATE};
use crate::report::{self, OutputFormat, Summary};

/// Arguments shared by the audit commands
#[derive(Args, Debug)]
pub struct AuditArgs {
  /// Branch to look for in every repository
  #[arg(value_name = "BRANCH")]
  pub branch: String,

  /// Base branch to compare against (defaults to the configured base)
  #[arg(long, short = 'b', value_name = "BRANCH")]
  pub base: Option<String>,

  /// Directory whose immediate children are the repositories to audit
  #[arg(long, short = 'r', value_name = "PATH", conflicts_with = "repos")]
  pub root: Option<PathBuf>,

  /// Audit only these repositories instead of discovering them
  #[arg(long = "repo", value_name = "PATH")]
  pub repos: Vec<PathBuf>,

  /// Fetch all remotes (with pruning) before inspecting
  #[arg(long, short = 'f')]
  pub fetch: bool,

  /// Number of repositories inspected at the same time
  #[arg(long, short = 'j', value_name = "N")]
  pub jobs: Option<usize>,

  /// Give up on a repository whose inspection takes longer than this
  #[arg(long, value_name = "SECS")]
  pub git_timeout: Option<u64>,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  pub format: OutputFormat,
}

pub(crate) fn handle_audit_command(args: AuditArgs, direction: Direction, config: &AuditConfig) -> Result<()> {
  let mut builder = config
    .request_builder(args.branch.as_str())
    .direction(direction)
    .sync_before_inspect(args.fetch);
  if let Some(base) = &args.base {
    builder = builder.base_ref(base.as_str());
  }
  if let Some(jobs) = args.jobs {
    builder = builder.concurrency_limit(jobs);
  }
  if let Some(secs) = args.git_timeout {
    builder = builder.git_timeout(Some(Duration::from_secs(secs)));
  }
  let request = builder.build()?;

  if request.sync_before_inspect() {
    // SAFETY: still single-threaded here, the runtime is only built below.
    unsafe { configure_transport_timeouts(request.sync_timeout()) }
      .context("Failed to configure git transport timeouts")?;
  }

  let repositories = if args.repos.is_empty() {
    let root = args.root.clone().unwrap_or_else(|| config.root_dir());
    debug!(root = %root.display(), "Discovering repositories");
    discover_repositories(&root)?
  } else {
    args
      .repos
      .iter()
      .map(RepositoryHandle::from_path)
      .collect::<Result<Vec<_>, _>>()?
  };

  if repositories.is_empty() && args.format == OutputFormat::Text {
    let root = args.root.unwrap_or_else(|| config.root_dir());
    print_warning(&format!(
      "No repositories found under {}",
      format_repo_path(&root.display().to_string())
    ));
    return Ok(());
  }

  let progress = progress_bar(repositories.len(), args.format)?;
  let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
  let results = rt.block_on(BatchScheduler::new().run(repositories, &request, |completed, _total| {
    progress.set_position(completed as u64);
  }));
  progress.finish_and_clear();
  // Work abandoned after a timeout must not hold up exit.
  rt.shutdown_background();

  match args.format {
    OutputFormat::Text => print!("{}", report::render_text(&results, &request)),
    OutputFormat::Json => println!("{}", report::render_json(&results, &request)?),
  }

  let summary = Summary::from_results(&results);
  if summary.errored > 0 {
    bail!(
      "{} of {} repositories could not be inspected",
      summary.errored,
      summary.total
    );
  }

  Ok(())
}

/// Progress bar on stderr; hidden for machine-readable output and when stderr
/// is not a terminal.
fn progress_bar(total: usize, format: OutputFormat) -> Result<ProgressBar> {
  if format == OutputFormat::Json {
    return Ok(ProgressBar::hidden());
  }

  let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
    .context("Invalid progress bar template")?
    .progress_chars(PROGRESS_CHARS);
  Ok(ProgressBar::new(total as u64).with_style(style))
}
