//! A Rust library for read-only analytics over a git history: per-author
//! contribution statistics, time-bucketed activity, branch lifecycle metadata and
//! file-change hotspots.
//!
//! Raw git text comes from a [`HistoryBackend`]; the default [`ExecBackend`]
//! requires the `git` executable to be installed and accessible in the PATH.
//!

pub mod error;
pub mod types;
pub mod query;
pub mod models;
pub mod parse;
pub mod backend;
pub mod analytics;
pub mod repository;

// Feature-gated modules
#[cfg(feature = "async")]
pub mod async_repository;

// Re-export key types
pub use crate::backend::{ExecBackend, GitCommand, HistoryBackend, ScriptedBackend};
pub use crate::error::GitError;
pub use crate::query::Query;
pub use crate::repository::Repository;
pub use crate::types::{BranchName, CommitHash, Result, TimeBucket, TrendPeriod};

// Conditional re-exports based on features
#[cfg(feature = "async")]
pub use crate::async_repository::AsyncRepository;

pub mod prelude {
    //! Convenient import for common GitNerds types and traits.
    pub use crate::analytics::*;
    pub use crate::backend::{ExecBackend, GitCommand, HistoryBackend, ScriptedBackend};
    pub use crate::error::GitError;
    pub use crate::models::*;
    pub use crate::query::Query;
    pub use crate::repository::Repository;
    pub use crate::types::{BranchName, CommitHash, Result, TimeBucket, TrendPeriod};

    #[cfg(feature = "async")]
    pub use crate::async_repository::AsyncRepository;
}
