//! Provides the Repository facade: one object exposing every read-only analysis.

use crate::analytics::authors::calendar_date;
use crate::analytics::{
    load_commits, AuthorAggregates, AuthorAnalyzer, BranchAnalyzer, FileAnalyzer, FileHotspots,
    TemporalAnalyzer,
};
use crate::backend::{ExecBackend, HistoryBackend};
use crate::models::*;
use crate::query::Query;
use crate::types::{BranchName, Result, TimeBucket, TrendPeriod};

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// Represents a Git history for read-only analysis.
///
/// Every operation is a function of the stored [`Query`] and the backend's current
/// state; results are rebuilt on each call.
#[derive(Debug, Clone)]
pub struct Repository<B: HistoryBackend = ExecBackend> {
    backend: B,
    query: Query,
    now: Option<DateTime<Utc>>,
}

impl Repository<ExecBackend> {
    /// Opens an existing Git repository for analysis with the default query.
    ///
    /// This checks if the path is actually a valid Git repository
    /// by running `git rev-parse --is-inside-work-tree`.
    ///
    /// # Arguments
    /// * `p` - The path to the local repository's root directory.
    ///
    /// # Errors
    /// Returns `GitError::NotAGitRepository` if the path is not a valid Git repository,
    /// or `GitError::GitNotFound`.
    pub fn open<P: AsRef<Path>>(p: P) -> Result<Repository> {
        Self::open_with_query(p, Query::default())
    }

    /// Opens a repository, analysing the part of the history `query` selects.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` before touching the filesystem if the query
    /// does not validate, then the errors of [`Repository::open`].
    pub fn open_with_query<P: AsRef<Path>>(p: P, query: Query) -> Result<Repository> {
        query.validate()?;
        Ok(Repository::with_backend(ExecBackend::open(p)?, query))
    }

    /// The repository's working directory.
    pub fn location(&self) -> &Path {
        self.backend.location()
    }
}

impl<B: HistoryBackend> Repository<B> {
    /// Wraps any history backend.
    pub fn with_backend(backend: B, query: Query) -> Self {
        Repository {
            backend,
            query,
            now: None,
        }
    }

    /// Pins the current time used for branch ages and heatmap windows.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// A view of the same backend analysing another query.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` if `query` does not validate.
    pub fn with_query(&self, query: Query) -> Result<Repository<&B>> {
        query.validate()?;
        Ok(Repository {
            backend: &self.backend,
            query,
            now: self.now,
        })
    }

    fn authors(&self) -> AuthorAnalyzer<'_, B> {
        AuthorAnalyzer::new(&self.backend, &self.query)
    }

    fn temporal(&self) -> TemporalAnalyzer<'_, B> {
        let analyzer = TemporalAnalyzer::new(&self.backend, &self.query);
        match self.now {
            Some(now) => analyzer.at(now),
            None => analyzer,
        }
    }

    fn branch_analyzer(&self) -> BranchAnalyzer<'_, B> {
        let analyzer = BranchAnalyzer::new(&self.backend, &self.query);
        match self.now {
            Some(now) => analyzer.at(now),
            None => analyzer,
        }
    }

    // --- Authors ---

    /// Per-author totals ranked by commit count; empty when there is no history.
    pub fn author_aggregates(&self) -> Result<Vec<AuthorAggregate>> {
        self.authors().detailed()
    }

    /// The `n` authors with the most commits.
    pub fn top_contributors(&self, n: usize) -> Result<Vec<AuthorAggregate>> {
        self.authors().top_contributors(n)
    }

    /// Commit counts per author as summarized by `git shortlog`.
    pub fn commits_per_author(&self) -> Result<Vec<AuthorCount>> {
        self.authors().commits_per_author()
    }

    /// Every author, ranked by commit count.
    pub fn contributors(&self) -> Result<Vec<Contributor>> {
        Ok(self
            .author_aggregates()?
            .iter()
            .map(Contributor::from)
            .collect())
    }

    /// Authors whose first commit falls after `since`, earliest first.
    pub fn new_contributors(&self, since: DateTime<Utc>) -> Result<Vec<Contributor>> {
        Ok(self
            .authors()
            .new_contributors(since)?
            .iter()
            .map(Contributor::from)
            .collect())
    }

    /// Up to `limit` reviewer emails for `path`, most frequent author first.
    pub fn suggest_reviewers(&self, path: &str, limit: usize) -> Result<Vec<String>> {
        Ok(self.reviewer_ranking(path, limit)?.emails())
    }

    /// Like [`Repository::suggest_reviewers`], keeping the touch counts.
    pub fn reviewer_ranking(&self, path: &str, limit: usize) -> Result<ReviewerRanking> {
        self.authors().suggest_reviewers(path, limit)
    }

    // --- Time ---

    /// Commits per key of `dimension`.
    pub fn temporal_buckets(&self, dimension: TimeBucket) -> Result<BucketCounts> {
        self.temporal().buckets(dimension)
    }

    pub fn commits_by_day(&self) -> Result<BucketCounts> {
        self.temporal().commits_by_day()
    }

    pub fn commits_by_month(&self) -> Result<BucketCounts> {
        self.temporal().commits_by_month()
    }

    pub fn commits_by_year(&self) -> Result<BucketCounts> {
        self.temporal().commits_by_year()
    }

    pub fn commits_by_weekday(&self) -> Result<BucketCounts> {
        self.temporal().commits_by_weekday()
    }

    pub fn commits_by_hour(&self) -> Result<BucketCounts<u32>> {
        self.temporal().commits_by_hour()
    }

    pub fn commits_by_timezone(&self) -> Result<BucketCounts> {
        self.temporal().commits_by_timezone()
    }

    /// Per-day, per-hour activity for the last `days` days.
    pub fn heatmap(&self, days: u32) -> Result<Heatmap> {
        self.temporal().heatmap(days)
    }

    /// Month-by-month activity for `year`, optionally for a single author.
    pub fn calendar(&self, year: i32, author: Option<&str>) -> Result<Calendar> {
        self.temporal().calendar(year, author)
    }

    /// Commit counts per `day`, `month` or `year`.
    ///
    /// # Errors
    /// Returns `GitError::InvalidPeriod` for any other period, without querying git.
    pub fn commit_trend(&self, period: &str) -> Result<Vec<TrendPoint>> {
        self.temporal().trend(period)
    }

    pub fn commit_trend_for(&self, period: TrendPeriod) -> Result<Vec<TrendPoint>> {
        self.temporal().trend_for(period)
    }

    // --- Branches ---

    /// Local branch names.
    pub fn branches(&self) -> Result<Vec<String>> {
        self.branch_analyzer().list()
    }

    /// Metadata for every local branch.
    pub fn branch_records(&self) -> Result<Vec<BranchRecord>> {
        self.branch_analyzer().detailed()
    }

    pub fn branches_by_date(&self) -> Result<Vec<BranchRecord>> {
        self.branch_analyzer().by_date()
    }

    pub fn active_branches(&self, days: u32) -> Result<Vec<BranchRecord>> {
        self.branch_analyzer().active(days)
    }

    pub fn stale_branches(&self, days: u32) -> Result<Vec<BranchRecord>> {
        self.branch_analyzer().stale(days)
    }

    pub fn current_branch(&self) -> Result<String> {
        self.branch_analyzer().current()
    }

    pub fn merge_statistics(&self) -> Result<MergeStatistics> {
        self.branch_analyzer().merge_statistics()
    }

    /// Commits ahead of and behind `other`, seen from the current branch.
    ///
    /// # Errors
    /// Returns `GitError::InvalidRefName` before any git call if `other` is not a
    /// valid reference name.
    pub fn compare_with_branch(&self, other: &str) -> Result<BranchComparison> {
        let other = BranchName::from_str(other)?;
        self.branch_analyzer().compare(&other)
    }

    pub fn tags(&self) -> Result<Vec<String>> {
        self.branch_analyzer().tags()
    }

    // --- Files ---

    /// Touched paths, most frequently changed first.
    pub fn file_hotspots(&self) -> Result<Vec<FileChangeFrequency>> {
        Ok(FileAnalyzer::new(&self.backend, &self.query).hotspots()?.into_vec())
    }

    pub fn top_files(&self, n: usize) -> Result<Vec<FileChangeFrequency>> {
        FileAnalyzer::new(&self.backend, &self.query).top(n)
    }

    // --- Summary ---

    /// Totals, authors, files and branches in one report.
    ///
    /// Commits are read once and shared by the author and file tallies.
    pub fn detailed_stats(&self) -> Result<ContributionStats> {
        let commits = load_commits(&self.backend, &self.query)?;
        let authors = AuthorAggregates::aggregate(&commits, self.query.reporting_offset);
        let files = FileHotspots::from_commits(&commits);
        let branches = self.branch_records()?;

        let lines_added: u64 = commits.iter().map(|c| c.additions).sum();
        let lines_deleted: u64 = commits.iter().map(|c| c.deletions).sum();
        let active_days = commits
            .iter()
            .map(|c| calendar_date(&c.timestamp, self.query.reporting_offset))
            .collect::<HashSet<_>>()
            .len();

        Ok(ContributionStats {
            total_commits: commits.len(),
            total_authors: authors.len(),
            total_files: files.len(),
            lines_added,
            lines_deleted,
            lines_changed: lines_added + lines_deleted,
            first_commit_at: commits.iter().map(|c| c.timestamp).min(),
            last_commit_at: commits.iter().map(|c| c.timestamp).max(),
            active_days,
            authors: authors.rank(),
            files: files.into_vec(),
            branches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GitCommand, ScriptedBackend};
    use crate::error::GitError;

    const LOG: &str = "\
c1|Ann|ann@x.com|2024-01-01 10:00:00 +0000|one
3\t1\ta.rs

c2|Bob|bob@x.com|2024-01-02 10:00:00 +0000|two
1\t1\ta.rs
2\t0\tb.rs
";

    fn repo() -> Repository<ScriptedBackend> {
        let backend = ScriptedBackend::new()
            .on(GitCommand::Log, LOG)
            .on(GitCommand::ForEachRef, "main|2024-01-02 10:00:00 +0000|abc1234|Bob\n")
            .on(GitCommand::CurrentBranch, "main\n")
            .on(GitCommand::RevList, "2\n");
        Repository::with_backend(backend, Query::default())
    }

    #[test]
    fn test_detailed_stats() {
        let stats = repo().detailed_stats().unwrap();
        assert_eq!(stats.total_commits, 2);
        assert_eq!(stats.total_authors, 2);
        assert_eq!(stats.total_files, 2);
        assert_eq!((stats.lines_added, stats.lines_deleted, stats.lines_changed), (6, 2, 8));
        assert_eq!(stats.active_days, 2);
        assert!(stats.first_commit_at < stats.last_commit_at);
        assert_eq!(stats.files[0].path, "a.rs");
        assert_eq!(stats.branches.len(), 1);
        assert!(stats.branches[0].is_current);
    }

    #[test]
    fn test_contributors() {
        let contributors = repo().contributors().unwrap();
        let emails: Vec<&str> = contributors.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(emails, vec!["ann@x.com", "bob@x.com"]);
    }

    #[test]
    fn test_compare_rejects_bad_name_without_calls() {
        let repo = repo();
        let err = repo.compare_with_branch("bad..name").unwrap_err();
        assert!(matches!(err, GitError::InvalidRefName(_)));
        assert_eq!(repo.backend().call_count(), 0);
    }

    #[test]
    fn test_with_query_validates() {
        let repo = repo();
        let mut query = Query::default();
        query.include_merges = true;
        query.merges_only = true;
        assert!(matches!(repo.with_query(query), Err(GitError::InvalidQuery(_))));

        let scoped = repo.with_query(Query::new().with_limit(1)).unwrap();
        scoped.author_aggregates().unwrap();
        assert!(repo.backend().calls()[0]
            .args
            .contains(&"--max-count=1".to_string()));
    }

    #[test]
    fn test_open_rejects_invalid_query_first() {
        let mut query = Query::default();
        query.author = Some(" ".to_string());
        let err = Repository::open_with_query("/definitely/not/here", query).unwrap_err();
        assert!(matches!(err, GitError::InvalidQuery(_)));
    }
}
