//! Parsers that turn raw git output into typed records.
//!
//! Every parser is a pure function of its input text. Lines that do not match the
//! expected shape are skipped (and traced), never reported as errors: one corrupt
//! line must not cost the rest of the listing.

use crate::models::{AuthorCount, BucketCounts, CommitRecord, FileStat};
use crate::types::CommitHash;

use chrono::{DateTime, FixedOffset};
use std::str::FromStr;

/// Field delimiter of a commit header line.
pub const HEADER_DELIMITER: char = '|';

/// `hash|author name|author email|date|subject`.
pub const HEADER_FIELDS: usize = 5;

/// Pretty format producing the header lines [`parse_commit_log`] expects.
/// Pair it with `--date=iso`.
pub const COMMIT_HEADER_FORMAT: &str = "%H|%an|%ae|%ad|%s";

/// Layout of `--date=iso` (`2024-01-01 10:00:00 +0000`).
const ISO_WITH_OFFSET: &str = "%Y-%m-%d %H:%M:%S %z";
/// ISO layout with a `T` separator and no fractional seconds.
const BARE_ISO: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parses a git timestamp, trying `--date=iso`, then RFC 3339, then bare ISO 8601.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_str(value, ISO_WITH_OFFSET)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .or_else(|_| DateTime::parse_from_str(value, BARE_ISO))
        .ok()
}

/// Parses one `additions<TAB>deletions<TAB>path` line.
///
/// A non-numeric count on either side (git prints `-` for binary files) makes both
/// counts 0, but the file is still reported. Lines with fewer than three fields
/// yield `None`.
pub fn parse_numstat_line(line: &str) -> Option<FileStat> {
    let mut parts = line.splitn(3, '\t');
    let (added, deleted, path) = (parts.next()?, parts.next()?, parts.next()?);
    if path.is_empty() {
        return None;
    }

    let (additions, deletions, binary) =
        match (added.trim().parse::<u64>(), deleted.trim().parse::<u64>()) {
            (Ok(a), Ok(d)) => (a, d, false),
            _ => (0, 0, true),
        };

    Some(FileStat {
        path: path.to_string(),
        additions,
        deletions,
        binary,
    })
}

/// Parses standalone `git log --numstat --format=` output.
pub fn parse_numstat(output: &str) -> Vec<FileStat> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let stat = parse_numstat_line(line);
            if stat.is_none() {
                tracing::trace!(line, "skipping malformed numstat line");
            }
            stat
        })
        .collect()
}

/// A numstat line has at least three tab fields, and its first field cannot be
/// mistaken for the start of a header.
fn is_numstat_line(line: &str) -> bool {
    let mut fields = line.split('\t');
    match fields.next() {
        Some(first) if !first.contains(HEADER_DELIMITER) => fields.count() >= 2,
        _ => false,
    }
}

fn parse_header(line: &str) -> Option<CommitRecord> {
    let parts: Vec<&str> = line.splitn(HEADER_FIELDS, HEADER_DELIMITER).collect();
    if parts.len() < HEADER_FIELDS {
        tracing::trace!(line, "skipping commit header with too few fields");
        return None;
    }

    let hash = match CommitHash::from_str(parts[0].trim()) {
        Ok(hash) => hash,
        Err(_) => {
            tracing::trace!(line, "skipping commit header without a hash");
            return None;
        }
    };

    let Some(timestamp) = parse_timestamp(parts[3]) else {
        tracing::trace!(line, "skipping commit with unparsable date");
        return None;
    };

    Some(CommitRecord {
        hash,
        author_name: parts[1].to_string(),
        author_email: parts[2].to_string(),
        timestamp,
        subject: parts[4].to_string(),
        additions: 0,
        deletions: 0,
        files: Vec::new(),
    })
}

/// Parses `git log --pretty=format:<COMMIT_HEADER_FORMAT> --date=iso [--numstat]` output.
///
/// Each commit starts with a header line and may be followed by numstat lines until
/// a blank line or the next header. A malformed header, or one whose date cannot be
/// parsed, drops that commit together with any numstat lines following it.
pub fn parse_commit_log(output: &str) -> Vec<CommitRecord> {
    let mut commits = Vec::new();
    let mut current: Option<CommitRecord> = None;

    for line in output.lines() {
        if line.trim().is_empty() {
            commits.extend(current.take());
            continue;
        }

        if is_numstat_line(line) {
            match (current.as_mut(), parse_numstat_line(line)) {
                (Some(commit), Some(stat)) => {
                    commit.additions += stat.additions;
                    commit.deletions += stat.deletions;
                    commit.files.push(stat);
                }
                _ => tracing::trace!(line, "skipping numstat line without a commit"),
            }
            continue;
        }

        commits.extend(current.take());
        current = parse_header(line);
    }

    commits.extend(current);
    tracing::debug!(commits = commits.len(), "parsed commit log");
    commits
}

/// Parses `git shortlog -s` output: `<count><whitespace><name...>` per line.
///
/// The name is the rest of the line rejoined with single spaces. Lines whose first
/// token is not an integer are skipped.
pub fn parse_author_counts(output: &str) -> Vec<AuthorCount> {
    output
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let count = tokens.next()?.parse::<usize>().ok();
            let name = tokens.collect::<Vec<_>>().join(" ");
            match count {
                Some(count) if !name.is_empty() => Some(AuthorCount { name, count }),
                _ => {
                    if !line.trim().is_empty() {
                        tracing::trace!(line, "skipping malformed shortlog line");
                    }
                    None
                }
            }
        })
        .collect()
}

/// Counts how often each non-blank (trimmed) line occurs.
///
/// The parser does not interpret the keys, so the same function buckets days,
/// months, weekdays, hours or timezones.
pub fn parse_date_counts(output: &str) -> BucketCounts {
    let mut counts = BucketCounts::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        *counts.entry(line.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Parses `git branch` / `git tag` listings.
///
/// Strips surrounding whitespace and one leading current-ref marker (`*`);
/// blank lines are dropped.
pub fn parse_ref_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map(str::trim).unwrap_or(line)
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
