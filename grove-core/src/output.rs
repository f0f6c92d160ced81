//! # Output Formatting
//!
//! Colored, emoji-prefixed helpers shared by everything that prints audit
//! results to a terminal.

use std::env;
use std::io::{self, IsTerminal};

use chrono::{DateTime, Utc};
use owo_colors::{OwoColorize, Stream, Style};
use {clap, emojis};

use crate::result::InspectionOutcome;

/// Number of hex digits shown for abbreviated commit ids.
pub const SHORT_HASH_LEN: usize = 8;

/// Enum representing different color modes for output
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
  /// Enable colored output
  Yes,
  /// Enable colored output (alias for Yes)
  Always,
  /// Automatically detect if colors should be used based on terminal
  /// capabilities
  Auto,
  /// Disable colored output
  No,
  /// Disable colored output (alias for No)
  Never,
}

impl ColorMode {
  /// Apply this mode as the process-wide color override.
  pub fn apply(self) {
    match self {
      Self::Always | Self::Yes => owo_colors::set_override(true),
      Self::Never | Self::No => owo_colors::set_override(false),
      Self::Auto => owo_colors::unset_override(),
    }
  }

  /// Whether diagnostics written to stderr should carry ANSI styling.
  pub fn colors_stderr(self) -> bool {
    match self {
      Self::Always | Self::Yes => true,
      Self::Never | Self::No => false,
      Self::Auto => io::stderr().is_terminal() && env::var_os("NO_COLOR").is_none_or(|value| value.is_empty()),
    }
  }
}

/// Helper function to safely get an emoji or fallback to a default character
pub fn get_emoji_or_default(name: &str, default: &str) -> String {
  match emojis::get_by_shortcode(name) {
    Some(emoji) => emoji.to_string(),
    None => default.to_string(),
  }
}

/// Style `text` for `stream`, honoring the color override and terminal
/// detection.
fn paint_for(stream: Stream, text: &str, style: Style) -> String {
  text.if_supports_color(stream, |t| t.style(style)).to_string()
}

fn paint(text: &str, style: Style) -> String {
  paint_for(Stream::Stdout, text, style)
}

/// Print a warning message
pub fn print_warning(message: &str) {
  let warning = get_emoji_or_default("warning", "⚠");
  println!("{} {}", paint(&warning, Style::new().yellow().bold()), message);
}

/// Print an info message
pub fn print_info(message: &str) {
  let info = get_emoji_or_default("information", "ℹ");
  println!("{} {}", paint(&info, Style::new().blue().bold()), message);
}

/// Print a section header
pub fn print_header(header: &str) {
  println!("\n{}", paint(header, Style::new().blue().bold()));
}

/// Format a repository path
pub fn format_repo_path(path: &str) -> String {
  paint(path, Style::new().bright_green())
}

/// Format a repository name
pub fn format_repo_name(name: &str) -> String {
  paint(name, Style::new().bright_cyan().bold())
}

/// Format a branch or reference name
pub fn format_ref_name(name: &str) -> String {
  paint(name, Style::new().magenta())
}

/// Format a commit timestamp, to the minute
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
  paint(&timestamp.format("%Y-%m-%d %H:%M UTC").to_string(), Style::new().yellow())
}

/// Format a command or command example
pub fn format_command(cmd: &str) -> String {
  paint(cmd, Style::new().purple())
}

/// Abbreviate and format a commit id
pub fn format_commit_hash(hash: &str) -> String {
  let short = hash.get(..SHORT_HASH_LEN).unwrap_or(hash);
  paint(short, Style::new().bright_black())
}

/// Describe a drift count in words, e.g. `3 commits behind`
pub fn format_drift(count: u64) -> String {
  let noun = if count == 1 { "commit" } else { "commits" };
  paint(&format!("{count} {noun} behind"), Style::new().yellow())
}

/// Section label for an outcome group
pub fn outcome_label(outcome: &InspectionOutcome) -> &'static str {
  match outcome {
    InspectionOutcome::Satisfied => "Satisfied",
    InspectionOutcome::Behind { .. } => "Behind",
    InspectionOutcome::MissingBranch => "Branch missing",
    InspectionOutcome::MissingBase => "Base missing",
    InspectionOutcome::Errored => "Errors",
  }
}

/// Emoji-prefixed, colored section header for an outcome group
pub fn format_outcome_header(outcome: &InspectionOutcome, count: usize) -> String {
  let (emoji, style) = match outcome {
    InspectionOutcome::Satisfied => (get_emoji_or_default("check_mark", "✓"), Style::new().green().bold()),
    InspectionOutcome::Behind { .. } => (get_emoji_or_default("warning", "⚠"), Style::new().yellow().bold()),
    InspectionOutcome::MissingBranch | InspectionOutcome::MissingBase => {
      (get_emoji_or_default("information", "ℹ"), Style::new().blue().bold())
    }
    InspectionOutcome::Errored => (get_emoji_or_default("cross_mark", "✗"), Style::new().red().bold()),
  };

  let label = format!("{} ({count})", outcome_label(outcome));
  format!("{emoji} {}", paint(&label, style))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn test_get_emoji_or_default() {
    let result = get_emoji_or_default("check_mark", "✓");
    assert!(!result.is_empty());

    let result = get_emoji_or_default("nonexistent_emoji", "fallback");
    assert_eq!(result, "fallback");
  }

  #[test]
  fn test_format_functions() {
    ColorMode::Never.apply();

    assert_eq!(format_repo_path("/fleet/alpha"), "/fleet/alpha");
    assert_eq!(format_repo_name("alpha"), "alpha");
    assert_eq!(format_ref_name("origin/feature/x"), "origin/feature/x");
    assert_eq!(format_command("grove merged feature/x"), "grove merged feature/x");
  }

  #[test]
  fn test_timestamp_is_shown_to_the_minute() {
    ColorMode::Never.apply();

    let timestamp = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 12).unwrap();
    assert_eq!(format_timestamp(&timestamp), "2024-05-17 09:30 UTC");
  }

  #[test]
  fn test_explicit_modes_decide_stderr_styling() {
    assert!(ColorMode::Always.colors_stderr());
    assert!(ColorMode::Yes.colors_stderr());
    assert!(!ColorMode::Never.colors_stderr());
    assert!(!ColorMode::No.colors_stderr());
  }

  #[test]
  fn test_commit_hash_is_abbreviated() {
    ColorMode::Never.apply();

    assert_eq!(format_commit_hash("0123456789abcdef0123"), "01234567");
    assert_eq!(format_commit_hash("abc"), "abc");
  }

  #[test]
  fn test_drift_wording() {
    ColorMode::Never.apply();

    assert_eq!(format_drift(1), "1 commit behind");
    assert_eq!(format_drift(3), "3 commits behind");
  }

  #[test]
  fn test_outcome_headers_name_the_group() {
    ColorMode::Never.apply();

    let header = format_outcome_header(&InspectionOutcome::Behind { drift: 2 }, 4);
    assert!(header.contains("Behind (4)"));
    assert_eq!(outcome_label(&InspectionOutcome::MissingBase), "Base missing");
  }
}
