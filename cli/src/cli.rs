//! CLI command definitions and handlers

use crate::report::{self, Format, Report};

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use gitnerds_core::{Query, Repository, TimeBucket};
use std::io::{self, Write};
use std::path::PathBuf;

/// Parses `YYYY-MM-DD` (start of day, UTC) or an RFC 3339 timestamp.
fn parse_since(s: &str) -> Result<DateTime<Utc>, String> {
    parse_date_bound(s, NaiveTime::MIN)
}

/// Parses `YYYY-MM-DD` (end of day, UTC) or an RFC 3339 timestamp.
fn parse_until(s: &str) -> Result<DateTime<Utc>, String> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    parse_date_bound(s, end_of_day)
}

fn parse_date_bound(s: &str, time: NaiveTime) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(time).and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("'{s}' is not a YYYY-MM-DD date or RFC 3339 timestamp"))
}

fn parse_dimension(s: &str) -> Result<TimeBucket, String> {
    s.parse::<TimeBucket>().map_err(|_| {
        let known: Vec<&str> = TimeBucket::ALL.iter().map(|b| b.as_str()).collect();
        format!("'{s}' is not one of {}", known.join(", "))
    })
}

/// GitNerds - contribution, activity and branch reports over git history
#[derive(Parser, Debug)]
#[command(name = "gitnerds")]
#[command(
    version,
    about = "Contribution, activity and branch reports over git history",
    after_help = "\
Examples:
  gitnerds summary                         Totals, contributors, hotspots and branches
  gitnerds authors --since 2024-01-01      Contributors since the start of 2024
  gitnerds activity weekday                Commits per weekday
  gitnerds trend month --format csv        Monthly commit counts as CSV
  gitnerds branches --stale 90             Branches untouched for 90 days
  gitnerds reviewers src/lib.rs --top 3    Who usually changes src/lib.rs

Set RUST_LOG=gitnerds_core=debug to see every git invocation."
)]
pub struct Cli {
    /// Path to the repository (default: current directory)
    #[arg(long, global = true, env = "GITNERDS_REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Only commits after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, global = true, env = "GITNERDS_SINCE", value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,

    /// Only commits before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, global = true, env = "GITNERDS_UNTIL", value_parser = parse_until)]
    pub until: Option<DateTime<Utc>>,

    /// Only commits whose author matches this pattern
    #[arg(long, global = true, env = "GITNERDS_AUTHOR")]
    pub author: Option<String>,

    /// Branch or revision to analyse (default: the current branch)
    #[arg(long, global = true, env = "GITNERDS_BRANCH")]
    pub branch: Option<String>,

    /// Restrict to this path (repeatable)
    #[arg(long = "path", global = true, env = "GITNERDS_PATH")]
    pub paths: Vec<String>,

    /// Leave out authors whose name or email matches this regex (repeatable)
    #[arg(long = "ignore-author", global = true, env = "GITNERDS_IGNORE_AUTHOR")]
    pub ignore_authors: Vec<String>,

    /// Include merge commits
    #[arg(long, global = true, conflicts_with = "merges_only")]
    pub merges: bool,

    /// Only merge commits
    #[arg(long, global = true)]
    pub merges_only: bool,

    /// Read at most this many commits (0 = unlimited)
    #[arg(long, global = true, env = "GITNERDS_LIMIT", default_value_t = 0)]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', global = true, env = "GITNERDS_FORMAT", value_enum, default_value_t = Format::Text)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Totals, contributors, most modified files and branches
    Summary,

    /// Contributors ranked by commits
    Authors {
        /// Show only the top N contributors
        #[arg(long)]
        top: Option<usize>,
    },

    /// Suggest reviewers for a path from who changed it most
    Reviewers {
        /// File or directory to find reviewers for
        path: String,

        /// Number of reviewers to suggest
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// Commit counts per day, month, year, weekday, hour or timezone
    Activity {
        /// day, month, year, weekday, hour or timezone
        #[arg(value_parser = parse_dimension)]
        dimension: TimeBucket,
    },

    /// Per-day activity over a trailing window
    Heatmap {
        /// Window length in days
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Month-by-month activity for one year (honours --author)
    Calendar {
        /// Year to show (default: the current year)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Commit counts per day, month or year
    Trend {
        /// day, month or year
        period: String,
    },

    /// Local branches with last activity and commit counts
    Branches {
        /// Only branches with a commit in the last N days
        #[arg(long, conflicts_with = "stale")]
        active: Option<u32>,

        /// Only branches without a commit in the last N days
        #[arg(long)]
        stale: Option<u32>,
    },

    /// Merge commit counts by author and month
    Merges,

    /// Commits ahead of and behind another branch
    Compare {
        /// Branch to compare the current branch with
        #[arg(value_name = "BRANCH")]
        other: String,
    },

    /// Most frequently changed files
    Hotspots {
        /// Number of files to show
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Tag names
    Tags,
}

impl Cli {
    /// Builds the history query from the global flags.
    pub fn query(&self) -> Result<Query> {
        let mut query = Query::new()
            .with_paths(self.paths.iter().cloned())
            .with_limit(self.limit);
        if let Some(branch) = &self.branch {
            query = query.with_branch(branch)?;
        }
        for pattern in &self.ignore_authors {
            query = query.ignore_author(pattern)?;
        }
        query.since = self.since;
        query.until = self.until;
        query.author = self.author.clone();
        query.include_merges = self.merges;
        query.merges_only = self.merges_only;
        Ok(query)
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let query = cli.query()?;
    let repo = Repository::open_with_query(&cli.repo, query)
        .with_context(|| format!("cannot analyse {}", cli.repo.display()))?;
    tracing::debug!(repo = %cli.repo.display(), command = ?cli.command, "running report");

    let report = build(&repo, &cli)?;
    let rendered = report.render(cli.format)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end())?;
    Ok(())
}

fn build(repo: &Repository, cli: &Cli) -> Result<Report> {
    match &cli.command {
        Commands::Summary => report::summary(&repo.detailed_stats()?),
        Commands::Authors { top } => {
            let mut authors = repo.author_aggregates()?;
            if let Some(n) = top {
                authors.truncate(*n);
            }
            report::authors(&authors)
        }
        Commands::Reviewers { path, top } => {
            report::reviewers(&repo.reviewer_ranking(path, *top)?)
        }
        Commands::Activity { dimension } => {
            report::buckets(*dimension, &repo.temporal_buckets(*dimension)?)
        }
        Commands::Heatmap { days } => report::heatmap(*days, &repo.heatmap(*days)?),
        Commands::Calendar { year } => {
            let year = year.unwrap_or_else(|| Utc::now().year());
            report::calendar(&repo.calendar(year, cli.author.as_deref())?)
        }
        Commands::Trend { period } => report::trend(period, &repo.commit_trend(period)?),
        Commands::Branches { active, stale } => match (active, stale) {
            (Some(days), _) => report::branches(
                &format!("Branches active in the last {days} days"),
                &repo.active_branches(*days)?,
            ),
            (None, Some(days)) => report::branches(
                &format!("Branches stale for {days} days"),
                &repo.stale_branches(*days)?,
            ),
            (None, None) => report::branches("Branches", &repo.branches_by_date()?),
        },
        Commands::Merges => report::merges(&repo.merge_statistics()?),
        Commands::Compare { other } => report::comparison(&repo.compare_with_branch(other)?),
        Commands::Hotspots { top } => report::hotspots(&repo.top_files(*top)?),
        Commands::Tags => report::names("Tags", &repo.tags()?),
    }
}
