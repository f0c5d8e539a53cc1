//! Provides asynchronous versions of repository operations using tokio.
//!
//! The analysis core stays synchronous; each call runs on tokio's blocking pool.

use crate::backend::{ExecBackend, HistoryBackend};
use crate::error::GitError;
use crate::models::*;
use crate::query::Query;
use crate::repository::Repository;
use crate::types::{Result, TimeBucket};

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A [`Repository`] shared across tasks, with async operations.
#[derive(Debug)]
pub struct AsyncRepository<B: HistoryBackend = ExecBackend> {
    inner: Arc<Repository<B>>,
}

impl<B: HistoryBackend> Clone for AsyncRepository<B> {
    fn clone(&self) -> Self {
        AsyncRepository {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl AsyncRepository<ExecBackend> {
    /// Opens an existing Git repository for analysis.
    ///
    /// # Errors
    /// Returns `GitError::NotAGitRepository` if the path is not a valid Git repository.
    pub async fn open<P: AsRef<Path>>(p: P) -> Result<AsyncRepository> {
        Self::open_with_query(p, Query::default()).await
    }

    pub async fn open_with_query<P: AsRef<Path>>(p: P, query: Query) -> Result<AsyncRepository> {
        let location: PathBuf = p.as_ref().to_path_buf();
        let repo = tokio::task::spawn_blocking(move || Repository::open_with_query(location, query))
            .await
            .map_err(join_error)??;
        Ok(AsyncRepository::from(repo))
    }
}

impl<B: HistoryBackend> From<Repository<B>> for AsyncRepository<B> {
    fn from(repo: Repository<B>) -> Self {
        AsyncRepository {
            inner: Arc::new(repo),
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> GitError {
    GitError::Backend(format!("blocking analysis task failed: {e}"))
}

impl<B> AsyncRepository<B>
where
    B: HistoryBackend + Send + Sync + 'static,
{
    /// The wrapped synchronous repository.
    pub fn blocking(&self) -> &Repository<B> {
        &self.inner
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Repository<B>) -> Result<T> + Send + 'static,
    {
        let repo = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&*repo))
            .await
            .map_err(join_error)?
    }

    pub async fn author_aggregates(&self) -> Result<Vec<AuthorAggregate>> {
        self.run(|repo| repo.author_aggregates()).await
    }

    pub async fn contributors(&self) -> Result<Vec<Contributor>> {
        self.run(|repo| repo.contributors()).await
    }

    pub async fn new_contributors(&self, since: DateTime<Utc>) -> Result<Vec<Contributor>> {
        self.run(move |repo| repo.new_contributors(since)).await
    }

    pub async fn commits_per_author(&self) -> Result<Vec<AuthorCount>> {
        self.run(|repo| repo.commits_per_author()).await
    }

    pub async fn suggest_reviewers(&self, path: &str, limit: usize) -> Result<Vec<String>> {
        let path = path.to_string();
        self.run(move |repo| repo.suggest_reviewers(&path, limit)).await
    }

    pub async fn temporal_buckets(&self, dimension: TimeBucket) -> Result<BucketCounts> {
        self.run(move |repo| repo.temporal_buckets(dimension)).await
    }

    pub async fn heatmap(&self, days: u32) -> Result<Heatmap> {
        self.run(move |repo| repo.heatmap(days)).await
    }

    pub async fn calendar(&self, year: i32, author: Option<String>) -> Result<Calendar> {
        self.run(move |repo| repo.calendar(year, author.as_deref())).await
    }

    pub async fn commit_trend(&self, period: &str) -> Result<Vec<TrendPoint>> {
        let period = period.to_string();
        self.run(move |repo| repo.commit_trend(&period)).await
    }

    pub async fn branch_records(&self) -> Result<Vec<BranchRecord>> {
        self.run(|repo| repo.branch_records()).await
    }

    pub async fn active_branches(&self, days: u32) -> Result<Vec<BranchRecord>> {
        self.run(move |repo| repo.active_branches(days)).await
    }

    pub async fn stale_branches(&self, days: u32) -> Result<Vec<BranchRecord>> {
        self.run(move |repo| repo.stale_branches(days)).await
    }

    pub async fn merge_statistics(&self) -> Result<MergeStatistics> {
        self.run(|repo| repo.merge_statistics()).await
    }

    pub async fn compare_with_branch(&self, other: &str) -> Result<BranchComparison> {
        let other = other.to_string();
        self.run(move |repo| repo.compare_with_branch(&other)).await
    }

    pub async fn file_hotspots(&self) -> Result<Vec<FileChangeFrequency>> {
        self.run(|repo| repo.file_hotspots()).await
    }

    pub async fn detailed_stats(&self) -> Result<ContributionStats> {
        self.run(|repo| repo.detailed_stats()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GitCommand, ScriptedBackend};

    fn scripted() -> AsyncRepository<ScriptedBackend> {
        let backend = ScriptedBackend::new()
            .on_arg(GitCommand::Log, "--date=format:%Y", "2023\n2024\n2024\n")
            .on(
                GitCommand::Log,
                "c1|Ann|ann@x.com|2024-01-01 10:00:00 +0000|one\n1\t0\ta.rs\n",
            );
        AsyncRepository::from(Repository::with_backend(backend, Query::default()))
    }

    #[tokio::test]
    async fn test_runs_on_blocking_pool() {
        let repo = scripted();
        let years = repo.temporal_buckets(TimeBucket::Year).await.unwrap();
        assert_eq!(years["2024"], 2);

        let authors = repo.clone().author_aggregates().await.unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(repo.blocking().backend().call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_period_is_reported() {
        let repo = scripted();
        let err = repo.commit_trend("week").await.unwrap_err();
        assert!(matches!(err, GitError::InvalidPeriod(_)));
    }
}
