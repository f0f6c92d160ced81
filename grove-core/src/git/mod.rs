//! Git plumbing used by the inspection engine.
//!
//! The module is split into focused submodules: reference resolution,
//! ancestry math, merge-commit lookup, and remote synchronization. Everything
//! except [`sync`] is read-only.

pub mod ancestry;
pub mod detection;
pub mod history;
pub mod refs;
pub mod repository;
pub mod sync;

pub use ancestry::AncestryEvaluator;
pub use detection::{GIT_METADATA_ENTRY, has_git_metadata};
pub use history::{DEFAULT_MERGE_SEARCH_DEPTH, find_merge_commit, mentions_branch};
pub use refs::{DEFAULT_REMOTE, RefResolver, RefStrategy};
pub use repository::open_repository;
pub use sync::{Git2Sync, RemoteSync, configure_transport_timeouts, fetch_all_remotes};
