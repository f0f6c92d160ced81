//! Test utilities shared across the grove workspace
//!
//! This crate provides common testing infrastructure including:
//! - Temporary git repositories ([`GitRepoTestGuard`])
//! - Multi-repository fleet roots ([`FleetGuard`])
//! - History shaping helpers (commits, branches, merges, remote-tracking refs)
//!
//! The clippy dead_code lint is disabled for this crate because test utilities
//! may not be used by all tests, and the compiler cannot detect usage across
//! crate boundaries in development dependencies.

#![allow(dead_code)]

pub mod fleet;
pub mod git;

// Re-export commonly used items
pub use fleet::FleetGuard;
pub use git::{
  GitRepoTestGuard, INITIAL_BRANCH, add_remote, branch_tip, checkout_branch, create_branch, create_commit,
  create_commits, create_merge_commit, delete_branch, init_repository, set_remote_tracking_ref,
};
