//! Author analytics: per-author totals, rankings and reviewer suggestions.

use crate::analytics::{identity_format, load_commits, split_identity};
use crate::backend::{GitCommand, HistoryBackend};
use crate::models::{AuthorAggregate, AuthorCount, CommitRecord, ReviewerCandidate, ReviewerRanking};
use crate::parse;
use crate::query::Query;
use crate::types::Result;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Author totals keyed by email, remembering the order authors first appeared in.
#[derive(Debug, Clone, Default)]
pub struct AuthorAggregates {
    authors: IndexMap<String, AuthorAggregate>,
}

impl AuthorAggregates {
    /// Aggregates commits in one pass.
    ///
    /// Emails are matched exactly (case-sensitive). Active days are then counted per
    /// author from that author's own timestamps, by calendar date in
    /// `reporting_offset`, or in each commit's recorded offset when `None`.
    pub fn aggregate<'c, I>(commits: I, reporting_offset: Option<FixedOffset>) -> Self
    where
        I: IntoIterator<Item = &'c CommitRecord>,
    {
        let mut authors: IndexMap<String, AuthorAggregate> = IndexMap::new();
        let mut timestamps: HashMap<&str, Vec<DateTime<FixedOffset>>> = HashMap::new();

        for commit in commits {
            let author = authors
                .entry(commit.author_email.clone())
                .or_insert_with(|| AuthorAggregate {
                    name: commit.author_name.clone(),
                    email: commit.author_email.clone(),
                    commits: 0,
                    lines_added: 0,
                    lines_deleted: 0,
                    files_changed: 0,
                    first_seen: commit.timestamp,
                    last_seen: commit.timestamp,
                    active_days: 0,
                });
            author.commits += 1;
            author.lines_added += commit.additions;
            author.lines_deleted += commit.deletions;
            author.files_changed += commit.files.len();
            author.first_seen = author.first_seen.min(commit.timestamp);
            author.last_seen = author.last_seen.max(commit.timestamp);
            timestamps
                .entry(commit.author_email.as_str())
                .or_default()
                .push(commit.timestamp);
        }

        for author in authors.values_mut() {
            author.active_days = timestamps
                .get(author.email.as_str())
                .into_iter()
                .flatten()
                .map(|ts| calendar_date(ts, reporting_offset))
                .collect::<HashSet<_>>()
                .len();
        }

        AuthorAggregates { authors }
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    pub fn get(&self, email: &str) -> Option<&AuthorAggregate> {
        self.authors.get(email)
    }

    /// Aggregates in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = &AuthorAggregate> {
        self.authors.values()
    }

    /// Authors by commit count, descending. Equal counts keep first-encounter order.
    pub fn rank(&self) -> Vec<AuthorAggregate> {
        let mut ranked: Vec<AuthorAggregate> = self.authors.values().cloned().collect();
        ranked.sort_by(|a, b| b.commits.cmp(&a.commits));
        ranked
    }

    /// Authors whose first commit is strictly after `since`, earliest first.
    pub fn new_contributors(&self, since: DateTime<Utc>) -> Vec<AuthorAggregate> {
        let mut fresh: Vec<AuthorAggregate> = self
            .authors
            .values()
            .filter(|a| a.first_seen.with_timezone(&Utc) > since)
            .cloned()
            .collect();
        fresh.sort_by(|a, b| a.first_seen.cmp(&b.first_seen));
        fresh
    }

    pub fn into_vec(self) -> Vec<AuthorAggregate> {
        self.authors.into_values().collect()
    }
}

pub(crate) fn calendar_date(ts: &DateTime<FixedOffset>, offset: Option<FixedOffset>) -> NaiveDate {
    match offset {
        Some(offset) => ts.with_timezone(&offset).date_naive(),
        None => ts.date_naive(),
    }
}

/// Ranks authors by how many of the given touches are theirs.
///
/// `emails` holds one entry per commit touching `path`, in history order. Ties keep
/// first-encounter order; at most `limit` candidates are returned.
pub fn rank_reviewers<I, S>(path: &str, emails: I, limit: usize) -> ReviewerRanking
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut touches: IndexMap<String, usize> = IndexMap::new();
    for email in emails {
        *touches.entry(email.as_ref().to_string()).or_insert(0) += 1;
    }

    let mut candidates: Vec<ReviewerCandidate> = touches
        .into_iter()
        .map(|(email, touches)| ReviewerCandidate { email, touches })
        .collect();
    candidates.sort_by(|a, b| b.touches.cmp(&a.touches));
    candidates.truncate(limit);

    ReviewerRanking {
        path: path.to_string(),
        candidates,
    }
}

/// Author-related analytics over a history backend.
#[derive(Debug)]
pub struct AuthorAnalyzer<'a, B: HistoryBackend + ?Sized> {
    backend: &'a B,
    query: &'a Query,
}

impl<'a, B: HistoryBackend + ?Sized> AuthorAnalyzer<'a, B> {
    pub fn new(backend: &'a B, query: &'a Query) -> Self {
        AuthorAnalyzer { backend, query }
    }

    /// Commit counts per author from `git shortlog -s -n -e`.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` or any backend failure.
    pub fn commits_per_author(&self) -> Result<Vec<AuthorCount>> {
        let args = self.query.shortlog_args()?;
        let output = self.backend.query(GitCommand::Shortlog, &args)?;

        let mut counts = parse::parse_author_counts(&output);
        if !self.query.ignore_authors.is_empty() {
            counts.retain(|c| {
                let name = c
                    .email()
                    .and_then(|e| c.name.strip_suffix(&format!("<{e}>")))
                    .map(str::trim_end)
                    .unwrap_or(&c.name);
                !self.query.is_ignored(name, c.email().unwrap_or(""))
            });
        }
        Ok(counts)
    }

    /// Aggregates every commit the query selects.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` or any backend failure; no partial
    /// aggregate is returned.
    pub fn aggregate(&self) -> Result<AuthorAggregates> {
        let commits = load_commits(self.backend, self.query)?;
        Ok(AuthorAggregates::aggregate(&commits, self.query.reporting_offset))
    }

    /// All authors ranked by commit count.
    pub fn detailed(&self) -> Result<Vec<AuthorAggregate>> {
        Ok(self.aggregate()?.rank())
    }

    /// The `n` authors with the most commits.
    pub fn top_contributors(&self, n: usize) -> Result<Vec<AuthorAggregate>> {
        let mut ranked = self.detailed()?;
        ranked.truncate(n);
        Ok(ranked)
    }

    /// Authors whose first commit falls after `since`, earliest first.
    pub fn new_contributors(&self, since: DateTime<Utc>) -> Result<Vec<AuthorAggregate>> {
        Ok(self.aggregate()?.new_contributors(since))
    }

    /// Suggests reviewers for `path`: the authors of the most commits touching it.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` for an empty path, or any backend failure.
    pub fn suggest_reviewers(&self, path: &str, limit: usize) -> Result<ReviewerRanking> {
        let mut query = self.query.clone();
        query.path_specs = vec![path.to_string()];
        let args = query.log_args(Some(&identity_format("")), None, false)?;

        let output = self.backend.query(GitCommand::Log, &args)?;
        let emails = output.lines().filter_map(|line| {
            let (email, name, _) = split_identity(line)?;
            (!email.is_empty() && !query.is_ignored(name, email)).then_some(email)
        });

        Ok(rank_reviewers(path, emails, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;
    use crate::error::GitError;
    use crate::parse::parse_commit_log;
    use chrono::TimeZone;

    const LOG: &str = "\
c1|Ann|ann@x.com|2024-01-01 10:00:00 +0000|one
3\t1\ta.rs
2\t0\tb.rs

c2|Bob|bob@x.com|2024-01-01 23:30:00 -0500|two
1\t1\ta.rs

c3|Ann|ann@x.com|2024-01-01 18:00:00 +0000|three
-\t-\tlogo.png

c4|Bob|bob@x.com|2024-01-03 08:00:00 +0000|four
10\t2\tc.rs

c5|Cy|cy@x.com|2024-01-05 08:00:00 +0000|five
";

    #[test]
    fn test_aggregate_empty() {
        let table = AuthorAggregates::aggregate(&Vec::<CommitRecord>::new(), None);
        assert!(table.is_empty());
        assert!(table.rank().is_empty());
    }

    #[test]
    fn test_aggregate_totals() {
        let commits = parse_commit_log(LOG);
        let table = AuthorAggregates::aggregate(&commits, None);
        assert_eq!(table.len(), 3);

        let ann = table.get("ann@x.com").unwrap();
        assert_eq!(ann.commits, 2);
        assert_eq!((ann.lines_added, ann.lines_deleted), (5, 1));
        assert_eq!(ann.files_changed, 3);
        assert_eq!(ann.active_days, 1);
        assert!(ann.first_seen < ann.last_seen);

        let bob = table.get("bob@x.com").unwrap();
        assert_eq!(bob.active_days, 2);
        assert_eq!(bob.lines_changed(), 14);

        for a in table.iter() {
            assert!(a.first_seen <= a.last_seen);
            assert!(a.active_days <= a.commits);
        }
    }

    #[test]
    fn test_emails_are_case_sensitive() {
        let commits = parse_commit_log(
            "c1|Ann|ann@x.com|2024-01-01 10:00:00 +0000|one\n\
             c2|Ann|ANN@x.com|2024-01-02 10:00:00 +0000|two\n",
        );
        assert_eq!(AuthorAggregates::aggregate(&commits, None).len(), 2);
    }

    #[test]
    fn test_active_days_follow_reporting_offset() {
        // 23:30 -05:00 is 04:30 UTC on the next day.
        let commits = parse_commit_log(
            "c1|Bob|bob@x.com|2024-01-01 23:30:00 -0500|late\n\
             c2|Bob|bob@x.com|2024-01-02 09:00:00 +0000|early\n",
        );
        let local = AuthorAggregates::aggregate(&commits, None);
        assert_eq!(local.get("bob@x.com").unwrap().active_days, 2);

        let utc = AuthorAggregates::aggregate(&commits, FixedOffset::east_opt(0));
        assert_eq!(utc.get("bob@x.com").unwrap().active_days, 1);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let commits = parse_commit_log(
            "c1|Zed|zed@x.com|2024-01-01 10:00:00 +0000|a\n\
             c2|Amy|amy@x.com|2024-01-02 10:00:00 +0000|b\n\
             c3|Max|max@x.com|2024-01-03 10:00:00 +0000|c\n\
             c4|Max|max@x.com|2024-01-04 10:00:00 +0000|d\n",
        );
        let ranked = AuthorAggregates::aggregate(&commits, None).rank();
        let emails: Vec<_> = ranked.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, vec!["max@x.com", "zed@x.com", "amy@x.com"]);
        assert!(ranked.windows(2).all(|w| w[0].commits >= w[1].commits));
    }

    #[test]
    fn test_new_contributors_sorted_by_first_seen() {
        let commits = parse_commit_log(LOG);
        let table = AuthorAggregates::aggregate(&commits, None);
        let since = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let fresh = table.new_contributors(since);
        let emails: Vec<_> = fresh.iter().map(|a| a.email.as_str()).collect();
        // Bob's first commit is 04:30 UTC on Jan 2; Ann started before the cutoff.
        assert_eq!(emails, vec!["bob@x.com", "cy@x.com"]);
    }

    #[test]
    fn test_rank_reviewers_ties_and_limit() {
        let ranking = rank_reviewers(
            "src/lib.rs",
            ["b@x", "a@x", "a@x", "c@x", "b@x", "d@x"],
            3,
        );
        assert_eq!(ranking.emails(), vec!["b@x", "a@x", "c@x"]);
        assert_eq!(ranking.candidates[0].touches, 2);
        assert_eq!(rank_reviewers("p", ["a@x"], 5).candidates.len(), 1);
        assert!(rank_reviewers("p", ["a@x"], 0).candidates.is_empty());
    }

    #[test]
    fn test_analyzer_filters_ignored_authors() {
        let backend = ScriptedBackend::new().on_arg(GitCommand::Log, "--numstat", LOG);
        let query = Query::new().ignore_author("^cy@").unwrap();
        let table = AuthorAnalyzer::new(&backend, &query).aggregate().unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.get("cy@x.com").is_none());
    }

    #[test]
    fn test_suggest_reviewers_uses_path_query() {
        let backend = ScriptedBackend::new().on(
            GitCommand::Log,
            "b@x\u{1f}B\u{1f}\na@x\u{1f}A\u{1f}\nb@x\u{1f}B\u{1f}\nbot@x\u{1f}ci[bot]\u{1f}\n",
        );
        let query = Query::new().ignore_author(r"\[bot\]").unwrap();
        let ranking = AuthorAnalyzer::new(&backend, &query)
            .suggest_reviewers("src/main.rs", 5)
            .unwrap();
        assert_eq!(ranking.emails(), vec!["b@x", "a@x"]);

        let call = &backend.calls()[0];
        assert_eq!(call.args[call.args.len() - 2..], ["--", "src/main.rs"]);
    }

    #[test]
    fn test_commits_per_author() {
        let backend = ScriptedBackend::new().on(
            GitCommand::Shortlog,
            "    12\tAnn <ann@x.com>\n     3\trenovate[bot] <bot@x.com>\n",
        );
        let query = Query::new().ignore_author(r"\[bot\]$").unwrap();
        let counts = AuthorAnalyzer::new(&backend, &query).commits_per_author().unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].email(), Some("ann@x.com"));
        assert_eq!(backend.calls()[0].args.last().unwrap(), "HEAD");
    }

    #[test]
    fn test_backend_failure_propagates() {
        let backend = ScriptedBackend::new().fail(GitCommand::Log, "killed");
        let query = Query::default();
        let err = AuthorAnalyzer::new(&backend, &query).detailed().unwrap_err();
        assert!(matches!(err, GitError::Backend(_)));
    }
}
