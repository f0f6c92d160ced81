//! Constants for the Grove CLI

/// Layout of the audit progress bar
pub const PROGRESS_TEMPLATE: &str =
  "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} repositories";

/// Fill, current and empty characters of the progress bar
pub const PROGRESS_CHARS: &str = "=> ";
