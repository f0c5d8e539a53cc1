//! Analyzers that aggregate parsed records along author, time, branch and file
//! dimensions.
//!
//! Each analyzer borrows a backend and a query, issues its backend calls
//! sequentially and builds fresh maps per call; nothing is cached between calls.

pub mod authors;
pub mod branches;
pub mod files;
pub mod temporal;

pub use authors::{rank_reviewers, AuthorAggregates, AuthorAnalyzer};
pub use branches::BranchAnalyzer;
pub use files::{FileAnalyzer, FileHotspots};
pub use temporal::TemporalAnalyzer;

use crate::backend::{GitCommand, HistoryBackend};
use crate::models::CommitRecord;
use crate::parse::{self, COMMIT_HEADER_FORMAT};
use crate::query::Query;
use crate::types::Result;

/// Separator between the author identity and the rest of a projected log line.
pub(crate) const IDENTITY_SEPARATOR: char = '\u{1f}';

/// Pretty format printing `email<US>name<US>` followed by `rest`.
pub(crate) fn identity_format(rest: &str) -> String {
    format!("%ae%x1f%an%x1f{rest}")
}

/// Splits a line produced by [`identity_format`] into `(email, name, rest)`.
pub(crate) fn split_identity(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.splitn(3, IDENTITY_SEPARATOR);
    Some((parts.next()?, parts.next()?, parts.next()?))
}

/// Reads commits with numstat for `query`, dropping ignored authors.
pub(crate) fn load_commits<B>(backend: &B, query: &Query) -> Result<Vec<CommitRecord>>
where
    B: HistoryBackend + ?Sized,
{
    let args = query.log_args(Some(COMMIT_HEADER_FORMAT), Some("iso"), true)?;
    let output = backend.query(GitCommand::Log, &args)?;

    let mut commits = parse::parse_commit_log(&output);
    if !query.ignore_authors.is_empty() {
        commits.retain(|c| !query.is_ignored(&c.author_name, &c.author_email));
    }
    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_round_trip() {
        let line = "a@x.com\u{1f}Ann Lee\u{1f}2024-01-01|09";
        assert_eq!(
            split_identity(line),
            Some(("a@x.com", "Ann Lee", "2024-01-01|09"))
        );
        assert_eq!(split_identity("no separators"), None);
        assert_eq!(identity_format("%ad"), "%ae%x1f%an%x1f%ad");
    }
}
