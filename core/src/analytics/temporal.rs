//! Time-based analytics: bucket counts, heatmaps, calendars and trends.
//!
//! Each bucket dimension is a separate `git log` projection with its own `--date=`
//! directive; the output goes through [`parse::parse_date_counts`]. Hours and days
//! are read in each commit's recorded offset, so two commits at the same instant
//! but in different offsets can land in different buckets.

use crate::analytics::{identity_format, split_identity};
use crate::backend::{GitCommand, HistoryBackend};
use crate::error::GitError;
use crate::models::{BucketCounts, Calendar, DayActivity, Heatmap, MonthActivity, TrendPoint};
use crate::parse;
use crate::query::Query;
use crate::types::{Result, TimeBucket, TrendPeriod};

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Date directive for heatmap lines: `YYYY-MM-DD|HH`.
const HEATMAP_DIRECTIVE: &str = "format:%Y-%m-%d|%H";

/// Largest distance of a recorded UTC offset from UTC (`+1400`).
const CALENDAR_OFFSET_SLACK_HOURS: i64 = 14;

static HEATMAP_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})\|(\d{1,2})$").expect("Invalid static heatmap line regex")
});

/// Time-based analytics over a history backend.
#[derive(Debug)]
pub struct TemporalAnalyzer<'a, B: HistoryBackend + ?Sized> {
    backend: &'a B,
    query: &'a Query,
    now: DateTime<Utc>,
}

impl<'a, B: HistoryBackend + ?Sized> TemporalAnalyzer<'a, B> {
    pub fn new(backend: &'a B, query: &'a Query) -> Self {
        TemporalAnalyzer {
            backend,
            query,
            now: Utc::now(),
        }
    }

    /// Uses `now` as the current time for trailing windows.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Runs a date projection and returns one key per selected commit, one per line.
    ///
    /// With ignore patterns the author identity is requested alongside the key so
    /// ignored commits can be dropped before counting.
    fn project(&self, query: &Query, directive: &str) -> Result<String> {
        if query.ignore_authors.is_empty() {
            let args = query.log_args(Some("%ad"), Some(directive), false)?;
            return self.backend.query(GitCommand::Log, &args);
        }

        let args = query.log_args(Some(&identity_format("%ad")), Some(directive), false)?;
        let output = self.backend.query(GitCommand::Log, &args)?;
        let kept: Vec<&str> = output
            .lines()
            .filter_map(split_identity)
            .filter(|(email, name, _)| !query.is_ignored(name, email))
            .map(|(_, _, key)| key)
            .collect();
        Ok(kept.join("\n"))
    }

    /// Commits per key of the given dimension.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` or any backend failure.
    pub fn buckets(&self, dimension: TimeBucket) -> Result<BucketCounts> {
        let output = self.project(self.query, dimension.date_directive())?;
        Ok(parse::parse_date_counts(&output))
    }

    /// Commits per `YYYY-MM-DD`.
    pub fn commits_by_day(&self) -> Result<BucketCounts> {
        self.buckets(TimeBucket::Day)
    }

    /// Commits per `YYYY-MM`.
    pub fn commits_by_month(&self) -> Result<BucketCounts> {
        self.buckets(TimeBucket::Month)
    }

    /// Commits per `YYYY`.
    pub fn commits_by_year(&self) -> Result<BucketCounts> {
        self.buckets(TimeBucket::Year)
    }

    /// Commits per weekday name (`Monday`..`Sunday`).
    pub fn commits_by_weekday(&self) -> Result<BucketCounts> {
        self.buckets(TimeBucket::Weekday)
    }

    /// Commits per offset string (`+0200`).
    pub fn commits_by_timezone(&self) -> Result<BucketCounts> {
        self.buckets(TimeBucket::Timezone)
    }

    /// Commits per hour of day (0-23) in each commit's recorded offset.
    pub fn commits_by_hour(&self) -> Result<BucketCounts<u32>> {
        let mut hours = BucketCounts::new();
        for (key, count) in self.buckets(TimeBucket::Hour)? {
            match key.parse::<u32>() {
                Ok(hour) if hour < 24 => *hours.entry(hour).or_insert(0) += count,
                _ => tracing::trace!(key, "skipping unparsable hour bucket"),
            }
        }
        Ok(hours)
    }

    /// Per-day, per-hour commit counts for the last `days` days.
    ///
    /// Only days with commits are listed, oldest first.
    pub fn heatmap(&self, days: u32) -> Result<Heatmap> {
        let mut query = self.query.clone();
        // A window reaching past chrono's range has no lower bound of its own.
        if let Some(window_start) = Duration::try_days(i64::from(days))
            .and_then(|span| self.now.checked_sub_signed(span))
        {
            query.since = Some(query.since.map_or(window_start, |s| s.max(window_start)));
        }

        let output = self.project(&query, HEATMAP_DIRECTIVE)?;

        let mut grid: BTreeMap<NaiveDate, BucketCounts<u32>> = BTreeMap::new();
        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some(caps) = HEATMAP_LINE_REGEX.captures(line) else {
                tracing::trace!(line, "skipping malformed heatmap line");
                continue;
            };
            let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d");
            let hour = caps[2].parse::<u32>();
            match (date, hour) {
                (Ok(date), Ok(hour)) if hour < 24 => {
                    *grid.entry(date).or_default().entry(hour).or_insert(0) += 1;
                }
                _ => tracing::trace!(line, "skipping heatmap line with invalid date"),
            }
        }

        let days = grid
            .into_iter()
            .map(|(date, hourly)| DayActivity {
                date,
                weekday: date.weekday(),
                commit_count: hourly.values().sum(),
                hourly,
            })
            .collect();

        Ok(Heatmap { days })
    }

    /// Month-by-month commit counts for one calendar year, optionally for one author.
    ///
    /// Dates outside `year` or that cannot be parsed are dropped. The backend window
    /// is widened by the largest UTC offset on both ends so that days read in a
    /// commit's own offset are not cut off at the year boundary.
    ///
    /// # Errors
    /// Returns `GitError::InvalidQuery` for a year chrono cannot represent, or any
    /// backend failure.
    pub fn calendar(&self, year: i32, author: Option<&str>) -> Result<Calendar> {
        let invalid_year = || GitError::InvalidQuery(format!("year {year} is out of range"));
        let slack = Duration::hours(CALENDAR_OFFSET_SLACK_HOURS);
        let mut query = self.query.clone();
        query.since = Some(
            Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
                .single()
                .and_then(|start| start.checked_sub_signed(slack))
                .ok_or_else(invalid_year)?,
        );
        query.until = Some(
            Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59)
                .single()
                .and_then(|end| end.checked_add_signed(slack))
                .ok_or_else(invalid_year)?,
        );
        if let Some(author) = author {
            query.author = Some(author.to_string());
        }

        let output = self.project(&query, TimeBucket::Day.date_directive())?;

        let mut per_month: Vec<BucketCounts<u32>> = vec![BucketCounts::new(); 12];
        for (key, count) in parse::parse_date_counts(&output) {
            match NaiveDate::parse_from_str(&key, "%Y-%m-%d") {
                Ok(date) if date.year() == year => {
                    *per_month[date.month0() as usize].entry(date.day()).or_insert(0) += count;
                }
                _ => tracing::trace!(key, "dropping date outside calendar year"),
            }
        }

        let months = per_month
            .into_iter()
            .enumerate()
            .map(|(idx, days)| month_activity(year, idx as u32 + 1, days))
            .collect::<Result<Vec<_>>>()?;

        Ok(Calendar {
            year,
            author: author.map(str::to_string),
            months,
        })
    }

    /// Commit counts per period, sorted by period key.
    ///
    /// # Errors
    /// Returns `GitError::InvalidPeriod` for anything but `day`, `month` or `year`,
    /// before any backend call is made.
    pub fn trend(&self, period: &str) -> Result<Vec<TrendPoint>> {
        let period = TrendPeriod::from_str(period)?;
        self.trend_for(period)
    }

    pub fn trend_for(&self, period: TrendPeriod) -> Result<Vec<TrendPoint>> {
        Ok(self
            .buckets(period.bucket())?
            .into_iter()
            .map(|(period, count)| TrendPoint { period, count })
            .collect())
    }
}

fn month_activity(year: i32, month: u32, days: BucketCounts<u32>) -> Result<MonthActivity> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| GitError::InvalidQuery(format!("year {year} is out of range")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let length = next
        .map(|n| (n - first).num_days() as usize)
        .unwrap_or(31);

    let lead = first.weekday().num_days_from_monday() as usize;
    let mut weeks = vec![[0usize; 7]; (lead + length).div_ceil(7)];
    for (&day, &count) in &days {
        let cell = lead + day as usize - 1;
        weeks[cell / 7][cell % 7] = count;
    }

    Ok(MonthActivity {
        month,
        total: days.values().sum(),
        days,
        weeks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;
    use chrono::Weekday;

    #[test]
    fn test_day_buckets() {
        let backend = ScriptedBackend::new().on_arg(
            GitCommand::Log,
            "--date=short",
            "2024-01-01\n2024-01-01\n2024-01-02\n",
        );
        let query = Query::default();
        let days = TemporalAnalyzer::new(&backend, &query).commits_by_day().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days["2024-01-01"], 2);
        assert_eq!(days["2024-01-02"], 1);
        assert!(days.values().all(|&c| c > 0));
    }

    #[test]
    fn test_each_dimension_requests_its_projection() {
        let backend = ScriptedBackend::new().on(GitCommand::Log, "x\n");
        let query = Query::default();
        let analyzer = TemporalAnalyzer::new(&backend, &query);
        for dimension in TimeBucket::ALL {
            analyzer.buckets(dimension).unwrap();
        }
        let directives: Vec<String> = backend
            .calls()
            .iter()
            .map(|c| c.args.iter().find(|a| a.starts_with("--date=")).unwrap().clone())
            .collect();
        assert_eq!(
            directives,
            vec![
                "--date=short",
                "--date=format:%Y-%m",
                "--date=format:%Y",
                "--date=format:%A",
                "--date=format:%H",
                "--date=format:%z",
            ]
        );
    }

    #[test]
    fn test_hour_buckets_skip_garbage() {
        let backend = ScriptedBackend::new().on(GitCommand::Log, "09\n09\n23\n24\nnoon\n00\n");
        let query = Query::default();
        let hours = TemporalAnalyzer::new(&backend, &query).commits_by_hour().unwrap();
        assert_eq!(hours.into_iter().collect::<Vec<_>>(), vec![(0, 1), (9, 2), (23, 1)]);
    }

    #[test]
    fn test_ignored_authors_are_not_counted() {
        let backend = ScriptedBackend::new().on(
            GitCommand::Log,
            "a@x\u{1f}Ann\u{1f}Monday\nbot@x\u{1f}ci[bot]\u{1f}Monday\nb@x\u{1f}Bob\u{1f}Friday\n",
        );
        let query = Query::new().ignore_author(r"\[bot\]").unwrap();
        let weekdays = TemporalAnalyzer::new(&backend, &query)
            .commits_by_weekday()
            .unwrap();
        assert_eq!(weekdays["Monday"], 1);
        assert_eq!(weekdays["Friday"], 1);
        assert!(backend.calls()[0].args[0].contains("%x1f"));
    }

    #[test]
    fn test_heatmap_lists_only_days_with_commits() {
        let backend = ScriptedBackend::new().on_arg(
            GitCommand::Log,
            HEATMAP_DIRECTIVE,
            "2024-03-05|14\n2024-03-01|09\n2024-03-05|14\n2024-03-05|02\nbad line\n2024-02-30|10\n",
        );
        let query = Query::default();
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap();
        let heatmap = TemporalAnalyzer::new(&backend, &query)
            .at(now)
            .heatmap(7)
            .unwrap();

        assert_eq!(heatmap.days.len(), 2);
        assert!(heatmap.days.iter().all(|d| d.commit_count > 0));
        assert_eq!(heatmap.days[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(heatmap.days[0].weekday, Weekday::Fri);
        let march5 = &heatmap.days[1];
        assert_eq!(march5.commit_count, 3);
        assert_eq!(march5.hourly[&14], 2);
        assert_eq!(march5.hourly[&2], 1);
        assert_eq!(heatmap.total_commits(), 4);

        let since = backend.calls()[0]
            .args
            .iter()
            .find(|a| a.starts_with("--since="))
            .cloned();
        assert_eq!(since.as_deref(), Some("--since=2024-02-28 00:00:00 +0000"));
    }

    #[test]
    fn test_calendar_months() {
        let backend = ScriptedBackend::new().on(
            GitCommand::Log,
            "2024-02-01\n2024-02-01\n2024-02-29\n2023-12-31\nnot-a-date\n",
        );
        let query = Query::default();
        let calendar = TemporalAnalyzer::new(&backend, &query)
            .calendar(2024, Some("ann@x.com"))
            .unwrap();

        assert_eq!(calendar.months.len(), 12);
        let feb = &calendar.months[1];
        assert_eq!(feb.month, 2);
        assert_eq!(feb.total, 3);
        assert_eq!(feb.days[&1], 2);
        // 2024-02-01 is a Thursday; February 2024 spans five week rows.
        assert_eq!(feb.weeks.len(), 5);
        assert_eq!(feb.weeks[0][3], 2);
        assert_eq!(feb.weeks[4][3], 1);
        assert_eq!(calendar.months[11].total, 0);

        let args = &backend.calls()[0].args;
        assert!(args.contains(&"--author=ann@x.com".to_string()));
        assert!(args.contains(&"--since=2023-12-31 10:00:00 +0000".to_string()));
        assert!(args.contains(&"--until=2025-01-01 13:59:59 +0000".to_string()));
    }

    #[test]
    fn test_calendar_keeps_days_read_in_the_commit_offset() {
        // Both commits happened in 2023 UTC but are dated in their own offsets.
        let backend = ScriptedBackend::new().on(GitCommand::Log, "2024-01-01\n2023-12-31\n");
        let query = Query::default();
        let calendar = TemporalAnalyzer::new(&backend, &query).calendar(2024, None).unwrap();
        assert_eq!(calendar.months[0].days[&1], 1);
        assert_eq!(calendar.months.iter().map(|m| m.total).sum::<usize>(), 1);
    }

    #[test]
    fn test_heatmap_window_past_the_calendar_range_has_no_lower_bound() {
        let backend = ScriptedBackend::new().on(GitCommand::Log, "2024-03-05|14\n");
        let query = Query::default();
        let heatmap = TemporalAnalyzer::new(&backend, &query).heatmap(u32::MAX).unwrap();
        assert_eq!(heatmap.total_commits(), 1);
        assert!(!backend.calls()[0].args.iter().any(|a| a.starts_with("--since=")));
    }

    #[test]
    fn test_heatmap_window_keeps_a_later_since() {
        let backend = ScriptedBackend::new().on(GitCommand::Log, "");
        let mut query = Query::default();
        query.since = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        TemporalAnalyzer::new(&backend, &query).heatmap(u32::MAX).unwrap();
        assert!(backend.calls()[0]
            .args
            .contains(&"--since=2024-03-01 00:00:00 +0000".to_string()));
    }

    #[test]
    fn test_trend_sorted_by_period() {
        let backend = ScriptedBackend::new().on(GitCommand::Log, "2024-03\n2023-11\n2024-03\n");
        let query = Query::default();
        let trend = TemporalAnalyzer::new(&backend, &query).trend("month").unwrap();
        assert_eq!(
            trend,
            vec![
                TrendPoint { period: "2023-11".into(), count: 1 },
                TrendPoint { period: "2024-03".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_invalid_trend_period_makes_no_calls() {
        let backend = ScriptedBackend::new().on(GitCommand::Log, "");
        let query = Query::default();
        let err = TemporalAnalyzer::new(&backend, &query).trend("week").unwrap_err();
        assert!(matches!(err, GitError::InvalidPeriod(p) if p == "week"));
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_empty_history_yields_empty_buckets() {
        let backend = ScriptedBackend::new().on(GitCommand::Log, "");
        let query = Query::default();
        let analyzer = TemporalAnalyzer::new(&backend, &query);
        assert!(analyzer.commits_by_month().unwrap().is_empty());
        assert!(analyzer.heatmap(30).unwrap().days.is_empty());
    }
}
