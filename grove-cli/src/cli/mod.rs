//! # Command Line Interface
//!
//! Defines the CLI structure and command handlers for the grove tool: fleet
//! audits in both ancestry directions, repository listing and configuration
//! display.

mod audit;
mod config;
mod list;

use anyhow::Result;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{ArgAction, Parser, Subcommand};
use grove_core::{AuditConfig, ColorMode, Direction};

pub use self::audit::AuditArgs;
pub use self::list::ListArgs;

/// Top-level CLI command for the grove tool
#[derive(Parser)]
#[command(name = "grove")]
#[command(display_name = "🌳 Grove")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(about = "Audit branch and merge state across a fleet of git repositories")]
#[command(
  long_about = "Grove inspects every repository beneath a root directory and reports, in bulk,\n\
        which repositories have a branch, whether it has been merged into the base\n\
        branch, and whether it contains all of the base branch's history."
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
#[command(subcommand_required(true))]
#[command(disable_help_subcommand = true)]
#[command(max_term_width = 120)]
#[command(styles = Styles::styled()
    .header(AnsiColor::BrightGreen.on_default().bold().underline())
    .usage(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::BrightGreen.on_default().bold())
    .placeholder(AnsiColor::BrightWhite.on_default().italic())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::BrightRed.on_default().bold())
)]
pub struct Cli {
  /// Sets the level of verbosity (can be used multiple times)
  #[arg(
    short = 'v',
    long = "verbose",
    action = ArgAction::Count,
    global = true,
    long_help = "Sets the level of verbosity for tracing and logging output.\n\n\
             -v: Show info level messages\n\
             -vv: Show debug level messages\n\
             -vvv: Show trace level messages"
  )]
  pub verbose: u8,

  /// Controls when colored output is used
  #[arg(
    long,
    value_enum,
    ignore_case = true,
    global = true,
    default_value_t = ColorMode::Auto,
  )]
  pub colors: ColorMode,

  /// Subcommands
  #[command(subcommand)]
  pub command: Commands,
}

/// Subcommands for the grove tool
#[derive(Subcommand)]
pub enum Commands {
  /// Check whether a branch has been merged into the base branch
  #[command(long_about = "Checks, in every repository of the fleet, whether BRANCH has been merged\n\
            into the base branch.\n\n\
            A repository is satisfied when the branch tip is an ancestor of the base branch\n\
            tip. Otherwise grove reports how many commits of the branch are missing from\n\
            the base. Branches that only exist as origin/<BRANCH> are found as well.")]
  #[command(alias = "m")]
  Merged(AuditArgs),

  /// Check whether a branch contains all of the base branch's history
  #[command(long_about = "Checks, in every repository of the fleet, whether BRANCH is up to date\n\
            with the base branch.\n\n\
            A repository is satisfied when the base branch tip is an ancestor of the\n\
            branch tip. Otherwise grove reports how many base commits the branch lacks.")]
  #[command(alias = "c")]
  Contains(AuditArgs),

  /// List the repositories that make up the fleet
  #[command(long_about = "Lists every repository discovered directly beneath the root directory,\n\
            in the order audits process them.")]
  #[command(alias = "ls")]
  List(ListArgs),

  /// Show the effective configuration
  #[command(long_about = "Shows where grove looks for its configuration file and the defaults\n\
            that apply to audits. Grove never writes this file.")]
  Config,
}

pub fn handle_cli(cli: Cli) -> Result<()> {
  cli.colors.apply();

  let audit_config = AuditConfig::load()?;

  match cli.command {
    Commands::Merged(args) => audit::handle_audit_command(args, Direction::BranchIntoBase, &audit_config),
    Commands::Contains(args) => audit::handle_audit_command(args, Direction::BaseIntoBranch, &audit_config),
    Commands::List(args) => list::handle_list_command(args, &audit_config),
    Commands::Config => config::handle_config_command(&audit_config),
  }
}
