//! Branch analytics: lifecycle metadata, activity classification, merges and
//! ahead/behind comparison.

use crate::analytics::{identity_format, split_identity};
use crate::backend::{GitCommand, HistoryBackend};
use crate::error::GitError;
use crate::models::{BranchComparison, BranchRecord, MergeStatistics};
use crate::parse;
use crate::query::Query;
use crate::types::{BranchName, CommitHash, Result};

use chrono::{DateTime, Duration, Utc};
use std::str::FromStr;

/// Delimiter of a reference metadata line.
const REF_DELIMITER: char = '|';

/// `name|committer date|head|author`, one line per local branch.
const REF_FORMAT: &str =
    "--format=%(refname:short)|%(committerdate:iso)|%(objectname:short)|%(authorname)";

const REF_FIELDS: usize = 4;

/// Branch analytics over a history backend.
#[derive(Debug)]
pub struct BranchAnalyzer<'a, B: HistoryBackend + ?Sized> {
    backend: &'a B,
    query: &'a Query,
    now: DateTime<Utc>,
}

impl<'a, B: HistoryBackend + ?Sized> BranchAnalyzer<'a, B> {
    pub fn new(backend: &'a B, query: &'a Query) -> Self {
        BranchAnalyzer {
            backend,
            query,
            now: Utc::now(),
        }
    }

    /// Uses `now` as the current time when computing branch ages.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Local branch names.
    ///
    /// Equivalent to `git branch --list`.
    pub fn list(&self) -> Result<Vec<String>> {
        let output = self.backend.query(GitCommand::Branch, &["--list".to_string()])?;
        Ok(parse::parse_ref_names(&output))
    }

    /// Tag names.
    ///
    /// Equivalent to `git tag --list`.
    pub fn tags(&self) -> Result<Vec<String>> {
        let output = self.backend.query(GitCommand::Tag, &["--list".to_string()])?;
        Ok(parse::parse_ref_names(&output))
    }

    /// Name of the checked-out branch (`HEAD` when detached).
    pub fn current(&self) -> Result<String> {
        Ok(self.backend.query(GitCommand::CurrentBranch, &[])?.trim().to_string())
    }

    /// Metadata for every local branch, in reference order.
    ///
    /// Issues one reference listing, then, when any branch exists, one current-branch
    /// lookup and one commit count per branch. References whose metadata line has fewer than four fields, an
    /// unparsable date or no head are skipped.
    ///
    /// # Errors
    /// Any backend failure, or `GitError::UnexpectedOutput` for a non-numeric count.
    pub fn detailed(&self) -> Result<Vec<BranchRecord>> {
        let output = self.backend.query(
            GitCommand::ForEachRef,
            &[REF_FORMAT.to_string(), "refs/heads/".to_string()],
        )?;
        if output.trim().is_empty() {
            return Ok(Vec::new());
        }
        let current = self.current()?;
        let window = Duration::days(i64::from(self.query.activity_window_days));

        let mut branches = Vec::new();
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            let parts: Vec<&str> = line.splitn(REF_FIELDS, REF_DELIMITER).collect();
            if parts.len() < REF_FIELDS {
                tracing::trace!(line, "skipping reference line with too few fields");
                continue;
            }
            let Some(last_commit_at) = parse::parse_timestamp(parts[1]) else {
                tracing::trace!(line, "skipping reference with unparsable date");
                continue;
            };
            let Ok(head) = CommitHash::from_str(parts[2].trim()) else {
                tracing::trace!(line, "skipping reference without a head");
                continue;
            };

            let name = parts[0].trim().to_string();
            let commit_count = self.rev_count(&name)?;
            let age = self.now.signed_duration_since(last_commit_at.with_timezone(&Utc));

            branches.push(BranchRecord {
                is_current: name == current,
                name,
                head,
                last_commit_at,
                last_commit_author: parts[3].trim().to_string(),
                commit_count,
                age,
                is_active: age < window,
            });
        }

        tracing::debug!(branches = branches.len(), "collected branch metadata");
        Ok(branches)
    }

    /// Branches sorted by last commit, newest first.
    pub fn by_date(&self) -> Result<Vec<BranchRecord>> {
        let mut branches = self.detailed()?;
        branches.sort_by(|a, b| b.last_commit_at.cmp(&a.last_commit_at));
        Ok(branches)
    }

    /// Branches with a commit in the last `days` days, newest first.
    pub fn active(&self, days: u32) -> Result<Vec<BranchRecord>> {
        let cutoff = Duration::days(i64::from(days));
        let mut branches = self.by_date()?;
        branches.retain(|b| b.age < cutoff);
        Ok(branches)
    }

    /// Branches without a commit in the last `days` days, oldest first.
    pub fn stale(&self, days: u32) -> Result<Vec<BranchRecord>> {
        let cutoff = Duration::days(i64::from(days));
        let mut branches = self.detailed()?;
        branches.retain(|b| b.age >= cutoff);
        branches.sort_by(|a, b| a.last_commit_at.cmp(&b.last_commit_at));
        Ok(branches)
    }

    /// Merge commit counts by author email and by month.
    ///
    /// The query's merge policy is replaced by merges-only; every other filter applies.
    pub fn merge_statistics(&self) -> Result<MergeStatistics> {
        let mut query = self.query.clone();
        query.include_merges = false;
        query.merges_only = true;
        let args = query.log_args(Some(&identity_format("%ad")), Some("format:%Y-%m"), false)?;
        let output = self.backend.query(GitCommand::Log, &args)?;

        let mut stats = MergeStatistics::default();
        for line in output.lines() {
            let Some((email, name, month)) = split_identity(line) else {
                if !line.trim().is_empty() {
                    tracing::trace!(line, "skipping malformed merge line");
                }
                continue;
            };
            if query.is_ignored(name, email) {
                continue;
            }
            stats.total_merges += 1;
            *stats.merges_by_author.entry(email.to_string()).or_insert(0) += 1;
            let month = month.trim();
            if !month.is_empty() {
                *stats.merges_by_month.entry(month.to_string()).or_insert(0) += 1;
            }
        }
        Ok(stats)
    }

    /// Counts commits on each side of the current branch and `other`.
    ///
    /// Issues two one-directional counts: `other..current`, then `current..other`.
    pub fn compare(&self, other: &BranchName) -> Result<BranchComparison> {
        let current = self.current()?;
        let other = other.to_string();
        let ahead = self.rev_count(&format!("{other}..{current}"))?;
        let behind = self.rev_count(&format!("{current}..{other}"))?;

        Ok(BranchComparison {
            current,
            other,
            ahead,
            behind,
        })
    }

    fn rev_count(&self, range: &str) -> Result<usize> {
        let output = self
            .backend
            .query(GitCommand::RevList, &["--count".to_string(), range.to_string()])?;
        output
            .trim()
            .parse::<usize>()
            .map_err(|_| GitError::UnexpectedOutput(format!("rev-list --count {range}: {output:?}")))
    }
}
