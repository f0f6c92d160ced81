//! # Audit Reports
//!
//! Groups a result set by outcome and renders it either as a human-readable
//! listing or as JSON. Rendering never inspects repositories; everything it
//! prints is already on the records.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use grove_core::output::{
  format_commit_hash, format_drift, format_outcome_header, format_ref_name, format_repo_name, format_timestamp,
};
use grove_core::{Direction, InspectionOutcome, InspectionRequest, InspectionResult};
use serde::Serialize;

/// How audit results are printed
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  /// Grouped, colored listing
  Text,
  /// The full result set as JSON
  Json,
}

/// Per-outcome counts for a result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub total: usize,
  pub satisfied: usize,
  pub behind: usize,
  pub missing_branch: usize,
  pub missing_base: usize,
  pub errored: usize,
  pub sync_failed: usize,
}

impl Summary {
  pub fn from_results(results: &[InspectionResult]) -> Self {
    let mut summary = Self {
      total: results.len(),
      ..Self::default()
    };

    for result in results {
      match result.outcome() {
        InspectionOutcome::Satisfied => summary.satisfied += 1,
        InspectionOutcome::Behind { .. } => summary.behind += 1,
        InspectionOutcome::MissingBranch => summary.missing_branch += 1,
        InspectionOutcome::MissingBase => summary.missing_base += 1,
        InspectionOutcome::Errored => summary.errored += 1,
      }
      if !result.sync_succeeded {
        summary.sync_failed += 1;
      }
    }

    summary
  }
}

/// Groups in display order, each with a representative outcome for its header.
const GROUPS: [InspectionOutcome; 5] = [
  InspectionOutcome::Satisfied,
  InspectionOutcome::Behind { drift: 0 },
  InspectionOutcome::MissingBranch,
  InspectionOutcome::MissingBase,
  InspectionOutcome::Errored,
];

fn same_group(a: &InspectionOutcome, b: &InspectionOutcome) -> bool {
  std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Render the grouped text report.
pub fn render_text(results: &[InspectionResult], request: &InspectionRequest) -> String {
  let mut out = String::new();
  let _ = writeln!(
    out,
    "Is {} {} {}?",
    format_ref_name(request.branch_ref()),
    request.direction().describe(),
    format_ref_name(request.base_ref())
  );

  for group in &GROUPS {
    let members: Vec<_> = results
      .iter()
      .filter(|result| same_group(&result.outcome(), group))
      .collect();
    if members.is_empty() {
      continue;
    }

    let _ = writeln!(out, "\n{}", format_outcome_header(group, members.len()));
    for result in members {
      let _ = writeln!(out, "  {}", describe(result));
    }
  }

  let summary = Summary::from_results(results);
  let _ = writeln!(
    out,
    "\n{} repositories: {} satisfied, {} behind, {} missing branch, {} missing base, {} errors",
    summary.total, summary.satisfied, summary.behind, summary.missing_branch, summary.missing_base, summary.errored
  );
  if summary.sync_failed > 0 {
    let _ = writeln!(out, "Remote sync failed for {} repositories", summary.sync_failed);
  }

  out
}

/// One line describing a single repository's result.
fn describe(result: &InspectionResult) -> String {
  let mut line = format!("{:<24}", format_repo_name(&result.repository.name));

  match result.outcome() {
    InspectionOutcome::Satisfied => {
      line.push_str(&format_ref_name(result.branch_ref.display_name()));
      push_tip(&mut line, result);
      if let Some(merge) = &result.merge_commit {
        let _ = write!(line, " (merged in {})", format_commit_hash(&merge.hash));
      }
    }
    InspectionOutcome::Behind { drift } => {
      let lagging = match result.direction {
        Direction::BranchIntoBase => &result.base_ref,
        Direction::BaseIntoBranch => &result.branch_ref,
      };
      let _ = write!(
        line,
        "{} {}",
        format_ref_name(lagging.display_name()),
        format_drift(drift)
      );
      push_tip(&mut line, result);
    }
    InspectionOutcome::MissingBranch => {
      let _ = write!(line, "no branch {}", format_ref_name(&result.branch_ref.requested_name));
    }
    InspectionOutcome::MissingBase => {
      let _ = write!(line, "no base branch {}", format_ref_name(&result.base_ref.requested_name));
    }
    InspectionOutcome::Errored => {
      if let Some(failure) = &result.failure {
        let _ = write!(line, "{}", failure.message);
      }
    }
  }

  if let Some(sync_error) = &result.sync_error {
    let _ = write!(line, " [sync failed: {sync_error}]");
  }

  line
}

/// Append the branch tip commit and when it was made.
fn push_tip(line: &mut String, result: &InspectionResult) {
  if let Some(hash) = &result.commit_hash {
    let _ = write!(line, " @ {}", format_commit_hash(hash));
  }
  if let Some(timestamp) = &result.commit_timestamp {
    let _ = write!(line, " ({})", format_timestamp(timestamp));
  }
}

#[derive(Serialize)]
struct JsonReport<'a> {
  branch: &'a str,
  base: &'a str,
  direction: Direction,
  summary: Summary,
  results: &'a [InspectionResult],
}

/// Render the full result set, with a summary, as pretty-printed JSON.
pub fn render_json(results: &[InspectionResult], request: &InspectionRequest) -> Result<String> {
  let report = JsonReport {
    branch: request.branch_ref(),
    base: request.base_ref(),
    direction: request.direction(),
    summary: Summary::from_results(results),
    results,
  };
  serde_json::to_string_pretty(&report).context("Failed to serialize audit report")
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use chrono::{TimeZone, Utc};
  use grove_core::{ColorMode, FailureStage, InspectionFailure, RefStrategy, RepositoryHandle, ResolvedRef};

  use super::*;

  fn resolved(name: &str, exists: bool) -> ResolvedRef {
    if !exists {
      return ResolvedRef::absent(name);
    }
    ResolvedRef {
      requested_name: name.to_string(),
      resolved_name: Some(name.to_string()),
      reference: Some(format!("refs/heads/{name}")),
      exists: true,
      commit_hash: Some("0123456789abcdef0123456789abcdef01234567".to_string()),
      source: Some(RefStrategy::LocalBranch),
    }
  }

  fn record(name: &str, branch: bool, satisfied: bool, drift: u64) -> InspectionResult {
    InspectionResult {
      repository: RepositoryHandle {
        name: name.to_string(),
        path: PathBuf::from("/fleet").join(name),
      },
      direction: Direction::BranchIntoBase,
      sync_succeeded: true,
      sync_error: None,
      branch_ref: resolved("feature/x", branch),
      base_ref: resolved("master", true),
      is_ancestor_satisfied: satisfied,
      drift_count: drift,
      commit_hash: None,
      commit_timestamp: None,
      merge_commit: None,
      failure: None,
    }
  }

  fn fleet_results() -> Vec<InspectionResult> {
    let mut errored = record("echo", true, false, 0);
    errored.failure = Some(InspectionFailure {
      stage: FailureStage::Open,
      message: "failed to open repository".into(),
    });
    let mut behind = record("bravo", true, false, 3);
    behind.commit_hash = Some("0123456789abcdef0123456789abcdef01234567".to_string());
    behind.commit_timestamp = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 12).single();
    let mut offline = record("delta", true, true, 0);
    offline.sync_succeeded = false;
    offline.sync_error = Some("remote sync timed out after 30s".into());

    vec![
      record("alpha", true, true, 0),
      behind,
      record("charlie", false, false, 0),
      offline,
      errored,
    ]
  }

  fn request() -> InspectionRequest {
    InspectionRequest::builder("feature/x").build().unwrap()
  }

  #[test]
  fn summary_counts_each_outcome() {
    let summary = Summary::from_results(&fleet_results());

    assert_eq!(
      summary,
      Summary {
        total: 5,
        satisfied: 2,
        behind: 1,
        missing_branch: 1,
        missing_base: 0,
        errored: 1,
        sync_failed: 1,
      }
    );
  }

  #[test]
  fn text_report_groups_by_outcome() {
    ColorMode::Never.apply();
    let text = render_text(&fleet_results(), &request());

    assert!(text.starts_with("Is feature/x merged into master?"));
    let satisfied = text.find("Satisfied (2)").unwrap();
    let behind = text.find("Behind (1)").unwrap();
    let missing = text.find("Branch missing (1)").unwrap();
    let errors = text.find("Errors (1)").unwrap();
    assert!(satisfied < behind && behind < missing && missing < errors);
    assert!(!text.contains("Base missing"));

    assert!(text.contains("3 commits behind @ 01234567 (2024-05-17 09:30 UTC)"));
    assert!(text.contains("[sync failed: remote sync timed out after 30s]"));
    assert!(text.contains("5 repositories: 2 satisfied, 1 behind, 1 missing branch, 0 missing base, 1 errors"));
  }

  #[test]
  fn json_report_carries_summary_and_records() {
    let json = render_json(&fleet_results(), &request()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["branch"], "feature/x");
    assert_eq!(value["direction"], "branch_into_base");
    assert_eq!(value["summary"]["errored"], 1);
    assert_eq!(value["results"].as_array().unwrap().len(), 5);
    assert_eq!(value["results"][1]["drift_count"], 3);
  }

  #[test]
  fn empty_result_set_renders_zero_summary() {
    ColorMode::Never.apply();
    let text = render_text(&[], &request());
    assert!(text.contains("0 repositories"));
  }
}
