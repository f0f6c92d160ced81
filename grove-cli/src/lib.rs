//! # Grove CLI Library
//!
//! Command definitions and report rendering for the grove command-line tool.

pub mod cli;
pub mod consts;
pub mod report;
