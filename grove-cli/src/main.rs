//! # Grove CLI Entry Point
//!
//! The main entry point for the grove command-line tool, which audits branch
//! and merge state across a fleet of local git repositories.

use std::io;

use anyhow::Result;
use clap::Parser;
use grove_cli::cli::{self, handle_cli};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
  // Parse CLI arguments using the derive-based implementation
  let cmd = cli::Cli::parse();

  // Set up tracing based on verbosity level
  let level = match cmd.verbose {
    0 => tracing::Level::WARN,  // Default: warnings and errors
    1 => tracing::Level::INFO,  // -v: info, warnings, and errors
    2 => tracing::Level::DEBUG, // -vv: debug, info, warnings, and errors
    _ => tracing::Level::TRACE, // -vvv or more: trace and everything else
  };

  // Logs go to stderr so JSON reports on stdout stay parseable
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr).with_ansi(cmd.colors.colors_stderr()))
    .with(EnvFilter::from_default_env().add_directive(level.into()))
    .init();

  debug!("Tracing initialized with level: {}", level);

  handle_cli(cmd)
}
