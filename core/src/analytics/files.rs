//! File-change hotspots: which paths change most, and who changes them.

use crate::analytics::load_commits;
use crate::backend::HistoryBackend;
use crate::models::{CommitRecord, FileChangeFrequency};
use crate::query::Query;
use crate::types::Result;

use indexmap::IndexMap;

#[derive(Debug)]
struct PathTally {
    frequency: FileChangeFrequency,
    /// Touches per author email, in first-encounter order.
    touches: IndexMap<String, usize>,
}

/// Per-path change counts, ranked by number of commits touching the path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileHotspots {
    files: Vec<FileChangeFrequency>,
}

impl FileHotspots {
    /// Tallies every file stat of `commits` in one pass.
    ///
    /// Ties in `changes` keep the order paths were first seen in the stream.
    pub fn from_commits<'c, I>(commits: I) -> Self
    where
        I: IntoIterator<Item = &'c CommitRecord>,
    {
        let mut tallies: IndexMap<String, PathTally> = IndexMap::new();

        for commit in commits {
            for stat in &commit.files {
                let tally = tallies.entry(stat.path.clone()).or_insert_with(|| PathTally {
                    frequency: FileChangeFrequency {
                        path: stat.path.clone(),
                        changes: 0,
                        additions: 0,
                        deletions: 0,
                        authors: Vec::new(),
                        primary_owner: None,
                        last_modified: commit.timestamp,
                    },
                    touches: IndexMap::new(),
                });

                let file = &mut tally.frequency;
                file.changes += 1;
                file.additions += stat.additions;
                file.deletions += stat.deletions;
                file.last_modified = file.last_modified.max(commit.timestamp);
                *tally.touches.entry(commit.author_email.clone()).or_insert(0) += 1;
            }
        }

        let mut files: Vec<FileChangeFrequency> = tallies
            .into_values()
            .map(|tally| {
                let mut file = tally.frequency;
                // max_by_key returns the last maximum; scan in reverse so the earliest wins.
                file.primary_owner = tally
                    .touches
                    .iter()
                    .rev()
                    .max_by_key(|&(_, &touches)| touches)
                    .map(|(email, _)| email.clone());
                file.authors = tally.touches.into_keys().collect();
                file
            })
            .collect();
        files.sort_by(|a, b| b.changes.cmp(&a.changes));

        FileHotspots { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileChangeFrequency> {
        self.files.iter()
    }

    /// The `n` most frequently changed paths.
    pub fn top(&self, n: usize) -> Vec<FileChangeFrequency> {
        self.files.iter().take(n).cloned().collect()
    }

    pub fn into_vec(self) -> Vec<FileChangeFrequency> {
        self.files
    }
}

/// File analytics over a history backend.
#[derive(Debug)]
pub struct FileAnalyzer<'a, B: HistoryBackend + ?Sized> {
    backend: &'a B,
    query: &'a Query,
}

impl<'a, B: HistoryBackend + ?Sized> FileAnalyzer<'a, B> {
    pub fn new(backend: &'a B, query: &'a Query) -> Self {
        FileAnalyzer { backend, query }
    }

    /// All touched paths, most frequently changed first.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` or any backend failure.
    pub fn hotspots(&self) -> Result<FileHotspots> {
        let commits = load_commits(self.backend, self.query)?;
        Ok(FileHotspots::from_commits(&commits))
    }

    /// The `n` most frequently changed paths.
    pub fn top(&self, n: usize) -> Result<Vec<FileChangeFrequency>> {
        Ok(self.hotspots()?.top(n))
    }
}
