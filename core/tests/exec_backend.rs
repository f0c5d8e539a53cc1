//! Runs the facade against a throwaway repository built with the `git` executable.
//! Every test returns early when git is not installed.

use gitnerds_core::prelude::*;

use chrono::{TimeZone, Utc};
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str], author: Option<(&str, &str, &str)>) {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
        .args(args)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some((name, email, date)) = author {
        cmd.env("GIT_AUTHOR_NAME", name)
            .env("GIT_AUTHOR_EMAIL", email)
            .env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_NAME", name)
            .env("GIT_COMMITTER_EMAIL", email)
            .env("GIT_COMMITTER_DATE", date);
    }
    let status = cmd.status().expect("failed to spawn git");
    assert!(status.success(), "git {args:?} failed");
}

fn commit(dir: &Path, file: &str, contents: &str, author: (&str, &str, &str), subject: &str) {
    std::fs::write(dir.join(file), contents).unwrap();
    git(dir, &["add", file], None);
    git(dir, &["commit", "-q", "-m", subject], Some(author));
}

/// Two authors, three commits on `main`, a `feature` branch one commit behind and a tag.
fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path();
    git(path, &["init", "-q"], None);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"], None);

    let ann = ("Ann", "ann@x.com", "2024-01-01T10:00:00+00:00");
    commit(path, "a.txt", "1\n2\n3\n", ann, "Initial");

    let bob = ("Bob", "bob@x.com", "2024-01-02T09:30:00+02:00");
    commit(path, "a.txt", "1\n2\n3\n4\n", bob, "Extend a");
    git(path, &["branch", "feature"], None);

    let ann_later = ("Ann", "ann@x.com", "2024-01-03T22:15:00-05:00");
    commit(path, "b.txt", "hello\n", ann_later, "Add b");
    git(path, &["tag", "v1.0"], None);

    dir
}

#[test]
fn open_rejects_plain_directory() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Repository::open(dir.path()),
        Err(GitError::NotAGitRepository(_))
    ));
}

#[test]
fn authors_and_files_from_real_history() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let repo = Repository::open(dir.path()).unwrap();

    let authors = repo.author_aggregates().unwrap();
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0].email, "ann@x.com");
    assert_eq!(authors[0].commits, 2);
    // The root commit adds three lines to a.txt but carries no file changes.
    assert_eq!(authors[0].lines_added, 1);
    assert_eq!(authors[0].files_changed, 1);
    assert_eq!(authors[1].lines_added, 1);

    let shortlog = repo.commits_per_author().unwrap();
    assert_eq!(shortlog[0].count, 2);
    assert_eq!(shortlog[0].email(), Some("ann@x.com"));

    let hotspots = repo.file_hotspots().unwrap();
    let paths: Vec<(&str, usize)> = hotspots.iter().map(|f| (f.path.as_str(), f.changes)).collect();
    assert_eq!(paths, vec![("b.txt", 1), ("a.txt", 1)]);

    assert_eq!(
        repo.suggest_reviewers("a.txt", 5).unwrap(),
        vec!["bob@x.com", "ann@x.com"]
    );
}

#[test]
fn root_commit_has_no_file_changes() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q"], None);
    commit(dir.path(), "a.txt", "1\n2\n3\n", ("Ann", "ann@x.com", "2024-01-01T10:00:00+00:00"), "Initial");

    let stats = Repository::open(dir.path()).unwrap().detailed_stats().unwrap();
    assert_eq!(stats.total_commits, 1);
    assert_eq!(stats.lines_added, 0);
    assert_eq!(stats.total_files, 0);
    assert_eq!(stats.authors[0].files_changed, 0);
}

#[test]
fn empty_repository_gives_empty_results() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q"], None);
    let repo = Repository::open(dir.path()).unwrap();

    assert!(repo.author_aggregates().unwrap().is_empty());
    assert!(repo.commits_per_author().unwrap().is_empty());
    assert!(repo.commits_by_day().unwrap().is_empty());
    assert!(repo.file_hotspots().unwrap().is_empty());
    assert!(repo.branch_records().unwrap().is_empty());
    assert!(repo.branches().unwrap().is_empty());
    assert!(repo.tags().unwrap().is_empty());
    assert_eq!(repo.merge_statistics().unwrap().total_merges, 0);

    let stats = repo.detailed_stats().unwrap();
    assert_eq!(stats.total_commits, 0);
    assert!(stats.first_commit_at.is_none());
}

#[test]
fn hours_use_the_recorded_offset() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let repo = Repository::open(dir.path()).unwrap();

    let hours = repo.commits_by_hour().unwrap();
    assert_eq!(hours.into_iter().collect::<Vec<_>>(), vec![(9, 1), (10, 1), (22, 1)]);

    let zones = repo.commits_by_timezone().unwrap();
    assert_eq!(zones["+0200"], 1);
    assert_eq!(zones["-0500"], 1);

    let trend = repo.commit_trend("year").unwrap();
    assert_eq!(trend.len(), 1);
    assert_eq!(trend[0].period, "2024");
    assert_eq!(trend[0].count, 3);

    let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
    let heatmap = Repository::open(dir.path()).unwrap().at(now).heatmap(30).unwrap();
    assert_eq!(heatmap.days.len(), 3);
    assert_eq!(heatmap.total_commits(), 3);
}

#[test]
fn branches_tags_and_comparison() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();
    let repo = Repository::open(dir.path()).unwrap().at(now);

    assert_eq!(repo.branches().unwrap(), vec!["feature", "main"]);
    assert_eq!(repo.tags().unwrap(), vec!["v1.0"]);
    assert_eq!(repo.current_branch().unwrap(), "main");

    let records = repo.branches_by_date().unwrap();
    assert_eq!(records[0].name, "main");
    assert!(records[0].is_current);
    assert_eq!(records[0].commit_count, 3);
    assert_eq!(records[1].commit_count, 2);
    assert!(records.iter().all(|b| b.is_active));

    let cmp = repo.compare_with_branch("feature").unwrap();
    assert_eq!((cmp.ahead, cmp.behind), (1, 0));

    assert!(matches!(
        repo.compare_with_branch("no-such-branch"),
        Err(GitError::GitError { .. })
    ));
}
