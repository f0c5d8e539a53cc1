//! The history query model and its conversion to `git log` arguments.

use crate::error::GitError;
use crate::types::{BranchName, Result};

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use std::str::FromStr;

/// Default number of days a branch may go without commits and still count as active.
pub const DEFAULT_ACTIVITY_WINDOW_DAYS: u32 = 30;

/// Timestamp layout handed to `--since`/`--until`; git parses it unambiguously.
const GIT_DATE_ARG_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Describes which part of the history an analysis looks at.
///
/// Merge commits are excluded unless `include_merges` or `merges_only` is set;
/// the two flags are mutually exclusive.
#[derive(Debug, Clone)]
pub struct Query {
    /// Only commits after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only commits before this instant.
    pub until: Option<DateTime<Utc>>,
    /// Author pattern passed to `--author` (git matches it against name and email).
    pub author: Option<String>,
    /// Revision to walk. `None` walks the current branch.
    pub branch: Option<BranchName>,
    /// Path specifications appended after `--`, e.g. `src/` or `:!vendor`.
    pub path_specs: Vec<String>,
    /// Commits whose author name or email matches any of these are left out.
    pub ignore_authors: Vec<Regex>,
    pub include_merges: bool,
    pub merges_only: bool,
    /// Maximum number of commits to read; `0` means no limit.
    pub limit: usize,
    /// Raw flags appended verbatim before the path specifications.
    pub extra_args: Vec<String>,
    /// Branches with a commit inside this many days are active.
    pub activity_window_days: u32,
    /// Offset used to decide which calendar day a commit belongs to when counting
    /// active days. `None` uses each commit's own recorded offset.
    pub reporting_offset: Option<FixedOffset>,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            since: None,
            until: None,
            author: None,
            branch: None,
            path_specs: Vec::new(),
            ignore_authors: Vec::new(),
            include_merges: false,
            merges_only: false,
            limit: 0,
            extra_args: Vec::new(),
            activity_window_days: DEFAULT_ACTIVITY_WINDOW_DAYS,
            reporting_offset: None,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the query to a branch, validating the reference name.
    pub fn with_branch(mut self, branch: &str) -> Result<Self> {
        self.branch = Some(BranchName::from_str(branch)?);
        Ok(self)
    }

    /// Adds an author ignore pattern.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` if the pattern is not a valid regular expression.
    pub fn ignore_author(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| GitError::InvalidQuery(format!("ignore pattern {pattern:?}: {e}")))?;
        self.ignore_authors.push(regex);
        Ok(self)
    }

    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_specs.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Checks that the query describes a consistent selection of commits.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` when merges are both included and exclusive,
    /// when `since` lies after `until`, or when an author pattern or path spec is empty.
    pub fn validate(&self) -> Result<()> {
        if self.include_merges && self.merges_only {
            return Err(GitError::InvalidQuery(
                "include_merges and merges_only are mutually exclusive".to_string(),
            ));
        }
        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since > until {
                return Err(GitError::InvalidQuery(format!(
                    "since ({since}) is after until ({until})"
                )));
            }
        }
        if matches!(&self.author, Some(a) if a.trim().is_empty()) {
            return Err(GitError::InvalidQuery("author pattern is empty".to_string()));
        }
        if self.path_specs.iter().any(|p| p.trim().is_empty()) {
            return Err(GitError::InvalidQuery("path spec is empty".to_string()));
        }
        Ok(())
    }

    /// Whether a commit by this author is excluded by `ignore_authors`.
    pub fn is_ignored(&self, name: &str, email: &str) -> bool {
        self.ignore_authors
            .iter()
            .any(|re| re.is_match(name) || re.is_match(email))
    }

    /// Builds the argument list for a history listing.
    ///
    /// # Arguments
    /// * `pretty` - Optional `--pretty=format:` string.
    /// * `date` - Optional `--date=` directive (e.g. `iso`, `short`, `format:%H`).
    /// * `numstat` - Whether to request per-file numeric stats.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` if the query does not validate.
    pub fn log_args(&self, pretty: Option<&str>, date: Option<&str>, numstat: bool) -> Result<Vec<String>> {
        self.validate()?;

        let mut args = Vec::new();

        if let Some(format) = pretty {
            args.push(format!("--pretty=format:{format}"));
        }
        if let Some(date) = date {
            args.push(format!("--date={date}"));
        }
        if numstat {
            args.push("--numstat".to_string());
        }

        if let Some(since) = self.since {
            args.push(format!("--since={}", since.format(GIT_DATE_ARG_FORMAT)));
        }
        if let Some(until) = self.until {
            args.push(format!("--until={}", until.format(GIT_DATE_ARG_FORMAT)));
        }

        if let Some(author) = &self.author {
            args.push(format!("--author={author}"));
        }

        if self.merges_only {
            args.push("--merges".to_string());
        } else if !self.include_merges {
            args.push("--no-merges".to_string());
        }

        if self.limit > 0 {
            args.push(format!("--max-count={}", self.limit));
        }

        if let Some(branch) = &self.branch {
            args.push(branch.to_string());
        }

        args.extend(self.extra_args.iter().cloned());

        if !self.path_specs.is_empty() {
            args.push("--".to_string());
            args.extend(self.path_specs.iter().cloned());
        }

        Ok(args)
    }

    /// Arguments for `git shortlog`, which reads stdin unless given a revision.
    pub(crate) fn shortlog_args(&self) -> Result<Vec<String>> {
        let mut args = vec!["-s".to_string(), "-n".to_string(), "-e".to_string()];
        let mut log_args = self.log_args(None, None, false)?;
        if self.branch.is_none() {
            let at = log_args
                .iter()
                .position(|a| a == "--")
                .unwrap_or(log_args.len());
            log_args.insert(at, "HEAD".to_string());
        }
        args.append(&mut log_args);
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_excludes_merges() {
        let args = Query::default().log_args(None, None, false).unwrap();
        assert_eq!(args, vec!["--no-merges"]);
    }

    #[test]
    fn test_full_argument_order() {
        let mut query = Query::new()
            .with_branch("main")
            .unwrap()
            .with_paths(["src/", ":!vendor"])
            .with_limit(10);
        query.since = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        query.author = Some("jane".to_string());
        query.extra_args = vec!["--first-parent".to_string()];

        let args = query
            .log_args(Some("%H|%an"), Some("iso"), true)
            .unwrap();
        assert_eq!(
            args,
            vec![
                "--pretty=format:%H|%an",
                "--date=iso",
                "--numstat",
                "--since=2024-01-01 00:00:00 +0000",
                "--author=jane",
                "--no-merges",
                "--max-count=10",
                "main",
                "--first-parent",
                "--",
                "src/",
                ":!vendor",
            ]
        );
    }

    #[test]
    fn test_merge_flags() {
        let mut query = Query::default();
        query.merges_only = true;
        assert!(query.log_args(None, None, false).unwrap().contains(&"--merges".to_string()));

        query.merges_only = false;
        query.include_merges = true;
        let args = query.log_args(None, None, false).unwrap();
        assert!(!args.iter().any(|a| a.contains("merges")));
    }

    #[test]
    fn test_conflicting_merge_flags_rejected() {
        let mut query = Query::default();
        query.include_merges = true;
        query.merges_only = true;
        assert!(matches!(query.validate(), Err(GitError::InvalidQuery(_))));
        assert!(query.log_args(None, None, false).is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut query = Query::default();
        query.since = Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        query.until = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(matches!(query.validate(), Err(GitError::InvalidQuery(_))));
    }

    #[test]
    fn test_ignore_patterns() {
        let query = Query::new().ignore_author(r"\[bot\]$").unwrap();
        assert!(query.is_ignored("dependabot[bot]", "x@y"));
        assert!(!query.is_ignored("Jane", "jane@x.com"));
        assert!(matches!(
            Query::new().ignore_author("(unclosed"),
            Err(GitError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_shortlog_always_names_a_revision() {
        let args = Query::new().with_paths(["lib/"]).shortlog_args().unwrap();
        assert_eq!(args, vec!["-s", "-n", "-e", "--no-merges", "HEAD", "--", "lib/"]);

        let args = Query::new().with_branch("dev").unwrap().shortlog_args().unwrap();
        assert_eq!(args, vec!["-s", "-n", "-e", "--no-merges", "dev"]);
    }
}
