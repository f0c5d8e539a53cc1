//! Provides structured types for parsed git records and analysis results.

use crate::types::CommitHash;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Weekday};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::collections::BTreeMap;

/// Commit counts per bucket key. Keys with no commits are absent, never zero.
pub type BucketCounts<K = String> = BTreeMap<K, usize>;

/// Per-file line counts from one numstat line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FileStat {
    pub path: String,
    /// Lines added; 0 for binary files.
    pub additions: u64,
    /// Lines deleted; 0 for binary files.
    pub deletions: u64,
    /// Whether git printed a non-numeric count (binary marker).
    pub binary: bool,
}

/// A commit as read from a `git log` listing.
///
/// Root commits carry no file changes: `additions`/`deletions` stay 0 and `files` is empty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CommitRecord {
    pub hash: CommitHash,
    pub author_name: String,
    pub author_email: String,
    /// Author date with the offset it was recorded in.
    pub timestamp: DateTime<FixedOffset>,
    pub subject: String,
    pub additions: u64,
    pub deletions: u64,
    /// Per-file stats, in numstat order.
    pub files: Vec<FileStat>,
}

impl CommitRecord {
    /// Paths touched, in numstat order.
    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }
}

/// One line of `git shortlog -s` output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AuthorCount {
    /// Everything after the count, whitespace-normalized. Includes `<email>` when
    /// shortlog ran with `-e`.
    pub name: String,
    pub count: usize,
}

impl AuthorCount {
    /// The `<email>` suffix printed by `shortlog -e`, if any.
    pub fn email(&self) -> Option<&str> {
        let rest = self.name.strip_suffix('>')?;
        let start = rest.rfind('<')?;
        Some(&rest[start + 1..])
    }
}

/// Contribution totals for one author, keyed by email.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AuthorAggregate {
    /// Name from the author's first commit in stream order.
    pub name: String,
    pub email: String,
    pub commits: usize,
    pub lines_added: u64,
    pub lines_deleted: u64,
    /// Sum of touched-file counts over all commits.
    pub files_changed: usize,
    pub first_seen: DateTime<FixedOffset>,
    pub last_seen: DateTime<FixedOffset>,
    /// Distinct calendar dates with at least one commit.
    pub active_days: usize,
}

impl AuthorAggregate {
    pub fn lines_changed(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }
}

/// Simplified contributor view.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Contributor {
    pub name: String,
    pub email: String,
    pub commits: usize,
    /// Time of the first commit.
    pub since: DateTime<FixedOffset>,
}

impl From<&AuthorAggregate> for Contributor {
    fn from(a: &AuthorAggregate) -> Self {
        Contributor {
            name: a.name.clone(),
            email: a.email.clone(),
            commits: a.commits,
            since: a.first_seen,
        }
    }
}

/// One entry of a reviewer ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ReviewerCandidate {
    pub email: String,
    /// Commits by this author that touched the path.
    pub touches: usize,
}

/// Authors ranked by how often they touched a path.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ReviewerRanking {
    pub path: String,
    pub candidates: Vec<ReviewerCandidate>,
}

impl ReviewerRanking {
    pub fn emails(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.email.clone()).collect()
    }
}

/// Represents a file's change frequency metrics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FileChangeFrequency {
    pub path: String,
    /// Number of commits that touched the file.
    pub changes: usize,
    pub additions: u64,
    pub deletions: u64,
    /// Emails of authors who modified this file, in first-encounter order.
    pub authors: Vec<String>,
    /// Author with the most changes; earliest encountered wins ties.
    pub primary_owner: Option<String>,
    pub last_modified: DateTime<FixedOffset>,
}

/// Commit activity for one calendar day of a heatmap.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DayActivity {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub commit_count: usize,
    /// Hour (0-23, in the commit's own offset) to commits.
    pub hourly: BucketCounts<u32>,
}

/// Days that had commits, oldest first. Days without commits are not listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Heatmap {
    pub days: Vec<DayActivity>,
}

impl Heatmap {
    pub fn total_commits(&self) -> usize {
        self.days.iter().map(|d| d.commit_count).sum()
    }
}

/// Commit counts for one month of a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MonthActivity {
    /// 1-12.
    pub month: u32,
    pub total: usize,
    /// Day of month to commits.
    pub days: BucketCounts<u32>,
    /// Week rows, Monday first; cells outside the month are 0.
    pub weeks: Vec<[usize; 7]>,
}

/// A year of commit activity, month by month.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Calendar {
    pub year: i32,
    pub author: Option<String>,
    /// Always twelve entries, January first.
    pub months: Vec<MonthActivity>,
}

/// Commit count for one period of a trend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TrendPoint {
    pub period: String,
    pub count: usize,
}

/// Reference metadata for a local branch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BranchRecord {
    pub name: String,
    pub head: CommitHash,
    pub last_commit_at: DateTime<FixedOffset>,
    pub last_commit_author: String,
    pub commit_count: usize,
    pub is_current: bool,
    /// Time since the last commit, as of the analysis.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub age: Duration,
    /// Whether `age` is inside the activity window.
    pub is_active: bool,
}

impl BranchRecord {
    pub fn age_days(&self) -> i64 {
        self.age.num_days()
    }
}

/// Merge commit counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MergeStatistics {
    pub total_merges: usize,
    /// Author email to merges.
    pub merges_by_author: BucketCounts,
    /// `YYYY-MM` to merges.
    pub merges_by_month: BucketCounts,
}

/// Commits unique to each side of two branches.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BranchComparison {
    pub current: String,
    pub other: String,
    /// Commits in `current` but not in `other`.
    pub ahead: usize,
    /// Commits in `other` but not in `current`.
    pub behind: usize,
}

/// Represents contribution statistics for a repository.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ContributionStats {
    pub total_commits: usize,
    pub total_authors: usize,
    /// Distinct paths touched.
    pub total_files: usize,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_changed: u64,
    pub first_commit_at: Option<DateTime<FixedOffset>>,
    pub last_commit_at: Option<DateTime<FixedOffset>>,
    /// Distinct calendar dates with at least one commit, across all authors.
    pub active_days: usize,
    /// Ranked by commits.
    pub authors: Vec<AuthorAggregate>,
    /// Ranked by changes.
    pub files: Vec<FileChangeFrequency>,
    pub branches: Vec<BranchRecord>,
}
