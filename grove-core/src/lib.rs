//! # Grove Core Library
//!
//! Concurrent branch-state inspection for fleets of local git working copies.
//! Discovery finds the repositories, [`BatchScheduler`] runs a
//! [`RepositoryInspector`] per repository in bounded waves, and every outcome
//! comes back as a plain [`InspectionResult`] record.

pub mod batch;
pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod inspect;
pub mod output;
pub mod request;
pub mod result;

pub use batch::BatchScheduler;
pub use config::{AuditConfig, ConfigDirs, get_config_dirs};
pub use discovery::{RepositoryHandle, discover_repositories};
pub use error::{AuditError, InspectionError, SyncError};
pub use git::{AncestryEvaluator, Git2Sync, RefResolver, RefStrategy, RemoteSync};
pub use inspect::RepositoryInspector;
pub use output::{ColorMode, format_repo_path, print_info, print_warning};
pub use request::{Direction, InspectionRequest, InspectionRequestBuilder};
pub use result::{FailureStage, InspectionFailure, InspectionOutcome, InspectionResult, MergeCommit, ResolvedRef};
