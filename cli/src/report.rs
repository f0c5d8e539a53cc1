//! Report rendering: every command result becomes a [`Report`] (a JSON value plus
//! one or more tables) rendered as text, JSON, CSV or Markdown.

use anyhow::Result;
use clap::ValueEnum;
use gitnerds_core::models::*;
use gitnerds_core::TimeBucket;
use serde::Serialize;
use std::fmt::Display;

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Csv,
    Markdown,
}

/// Rows under a heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn new(title: &str, headers: &[&str]) -> Self {
        Table {
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.rows.push(cells.into_iter().map(|c| c.to_string()).collect());
    }
}

/// A rendered command result.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub json: serde_json::Value,
    pub tables: Vec<Table>,
}

impl Report {
    fn new<T: Serialize + ?Sized>(title: &str, data: &T, tables: Vec<Table>) -> Result<Self> {
        Ok(Report {
            title: title.to_string(),
            json: serde_json::to_value(data)?,
            tables,
        })
    }

    pub fn render(&self, format: Format) -> Result<String> {
        Ok(match format {
            Format::Json => serde_json::to_string_pretty(&self.json)?,
            Format::Text => self.render_text(),
            Format::Csv => self.render_csv(),
            Format::Markdown => self.render_markdown(),
        })
    }

    fn render_text(&self) -> String {
        let mut out = format!("{}\n{}\n", self.title, "=".repeat(self.title.chars().count()));
        for table in &self.tables {
            out.push('\n');
            if table.title != self.title {
                out.push_str(&format!("{}\n", table.title));
            }
            if table.rows.is_empty() {
                out.push_str("  (none)\n");
                continue;
            }

            let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
            for row in &table.rows {
                for (width, cell) in widths.iter_mut().zip(row) {
                    *width = (*width).max(cell.chars().count());
                }
            }
            let line = |cells: &[String]| {
                let padded: Vec<String> = cells
                    .iter()
                    .zip(&widths)
                    .map(|(cell, &width)| format!("{cell:<width$}"))
                    .collect();
                format!("  {}\n", padded.join("  ").trim_end())
            };

            out.push_str(&line(&table.headers));
            let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
            out.push_str(&line(&rule));
            for row in &table.rows {
                out.push_str(&line(row));
            }
        }
        out
    }

    fn render_csv(&self) -> String {
        let mut sections = Vec::new();
        for table in &self.tables {
            let mut section = String::new();
            section.push_str(&csv_line(&table.headers));
            for row in &table.rows {
                section.push_str(&csv_line(row));
            }
            sections.push(section);
        }
        sections.join("\n")
    }

    fn render_markdown(&self) -> String {
        let mut md = format!("# {}\n", self.title);
        for table in &self.tables {
            md.push('\n');
            if table.title != self.title {
                md.push_str(&format!("## {}\n\n", table.title));
            }
            if table.rows.is_empty() {
                md.push_str("_None._\n");
                continue;
            }
            md.push_str(&format!("| {} |\n", table.headers.join(" | ")));
            md.push_str(&format!("|{}\n", "---|".repeat(table.headers.len())));
            for row in &table.rows {
                let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
                md.push_str(&format!("| {} |\n", cells.join(" | ")));
            }
        }
        md
    }
}

fn csv_line(cells: &[String]) -> String {
    let quoted: Vec<String> = cells
        .iter()
        .map(|cell| {
            if cell.contains([',', '"', '\n']) {
                format!("\"{}\"", cell.replace('"', "\"\""))
            } else {
                cell.clone()
            }
        })
        .collect();
    format!("{}\n", quoted.join(","))
}

fn date<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

// --- Builders ---

pub fn summary(stats: &ContributionStats) -> Result<Report> {
    let mut totals = Table::new("Summary", &["Metric", "Value"]);
    totals.row(["Total commits".to_string(), stats.total_commits.to_string()]);
    totals.row(["Total authors".to_string(), stats.total_authors.to_string()]);
    totals.row(["Total files".to_string(), stats.total_files.to_string()]);
    totals.row(["Lines added".to_string(), stats.lines_added.to_string()]);
    totals.row(["Lines deleted".to_string(), stats.lines_deleted.to_string()]);
    totals.row(["Active days".to_string(), stats.active_days.to_string()]);
    totals.row(["First commit".to_string(), date(stats.first_commit_at)]);
    totals.row(["Last commit".to_string(), date(stats.last_commit_at)]);

    let mut files = hotspot_table(&stats.files);
    files.rows.truncate(10);

    Report::new(
        "Repository Statistics",
        stats,
        vec![
            totals,
            author_table(&stats.authors),
            files,
            branch_table(&stats.branches),
        ],
    )
}

fn author_table(authors: &[AuthorAggregate]) -> Table {
    let mut table = Table::new(
        "Contributors",
        &["Name", "Email", "Commits", "Added", "Deleted", "Active days", "First", "Last"],
    );
    for a in authors {
        table.row([
            a.name.clone(),
            a.email.clone(),
            a.commits.to_string(),
            a.lines_added.to_string(),
            a.lines_deleted.to_string(),
            a.active_days.to_string(),
            a.first_seen.date_naive().to_string(),
            a.last_seen.date_naive().to_string(),
        ]);
    }
    table
}

pub fn authors(authors: &[AuthorAggregate]) -> Result<Report> {
    Report::new("Contributors", authors, vec![author_table(authors)])
}

pub fn reviewers(ranking: &ReviewerRanking) -> Result<Report> {
    let mut table = Table::new(&format!("Reviewers for {}", ranking.path), &["Email", "Commits"]);
    for c in &ranking.candidates {
        table.row([c.email.clone(), c.touches.to_string()]);
    }
    Report::new(&table.title.clone(), ranking, vec![table])
}

pub fn buckets(dimension: TimeBucket, counts: &BucketCounts) -> Result<Report> {
    let title = format!("Commits by {dimension}");
    let mut table = Table::new(&title, &[dimension.as_str(), "commits"]);
    for (key, count) in counts {
        table.row([key.clone(), count.to_string()]);
    }
    Report::new(&title, counts, vec![table])
}

pub fn heatmap(days: u32, heatmap: &Heatmap) -> Result<Report> {
    let title = format!("Activity over the last {days} days");
    let mut table = Table::new(&title, &["Date", "Weekday", "Commits", "Busiest hour"]);
    for day in &heatmap.days {
        let busiest = day
            .hourly
            .iter()
            .rev()
            .max_by_key(|&(_, &count)| count)
            .map(|(hour, _)| format!("{hour:02}:00"))
            .unwrap_or_default();
        table.row([
            day.date.to_string(),
            day.weekday.to_string(),
            day.commit_count.to_string(),
            busiest,
        ]);
    }
    Report::new(&title, heatmap, vec![table])
}

pub fn calendar(calendar: &Calendar) -> Result<Report> {
    let title = match &calendar.author {
        Some(author) => format!("{} calendar for {author}", calendar.year),
        None => format!("{} calendar", calendar.year),
    };
    let mut table = Table::new(
        &title,
        &["Month", "Commits", "Active days", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    );
    for month in &calendar.months {
        let mut weekdays = [0usize; 7];
        for week in &month.weeks {
            for (total, cell) in weekdays.iter_mut().zip(week) {
                *total += cell;
            }
        }
        let mut cells = vec![
            format!("{}-{:02}", calendar.year, month.month),
            month.total.to_string(),
            month.days.len().to_string(),
        ];
        cells.extend(weekdays.iter().map(|n| n.to_string()));
        table.row(cells);
    }
    Report::new(&title, calendar, vec![table])
}

pub fn trend(period: &str, points: &[TrendPoint]) -> Result<Report> {
    let title = format!("Commit trend by {period}");
    let mut table = Table::new(&title, &["Period", "Commits"]);
    for p in points {
        table.row([p.period.clone(), p.count.to_string()]);
    }
    Report::new(&title, points, vec![table])
}

fn branch_table(branches: &[BranchRecord]) -> Table {
    let mut table = Table::new(
        "Branches",
        &["Name", "Current", "Commits", "Last commit", "Author", "Age (days)", "Active"],
    );
    for b in branches {
        table.row([
            b.name.clone(),
            if b.is_current { "*".to_string() } else { String::new() },
            b.commit_count.to_string(),
            b.last_commit_at.to_string(),
            b.last_commit_author.clone(),
            b.age_days().to_string(),
            if b.is_active { "yes" } else { "no" }.to_string(),
        ]);
    }
    table
}

pub fn branches(title: &str, branches: &[BranchRecord]) -> Result<Report> {
    let mut table = branch_table(branches);
    table.title = title.to_string();
    Report::new(title, branches, vec![table])
}

pub fn merges(stats: &MergeStatistics) -> Result<Report> {
    let mut totals = Table::new("Merges", &["Metric", "Value"]);
    totals.row(["Total merges".to_string(), stats.total_merges.to_string()]);

    let mut by_author = Table::new("Merges by author", &["Email", "Merges"]);
    let mut authors: Vec<(&String, &usize)> = stats.merges_by_author.iter().collect();
    authors.sort_by(|a, b| b.1.cmp(a.1));
    for (email, count) in authors {
        by_author.row([email.clone(), count.to_string()]);
    }

    let mut by_month = Table::new("Merges by month", &["Month", "Merges"]);
    for (month, count) in &stats.merges_by_month {
        by_month.row([month.clone(), count.to_string()]);
    }

    Report::new("Merges", stats, vec![totals, by_author, by_month])
}

pub fn comparison(cmp: &BranchComparison) -> Result<Report> {
    let title = format!("{} compared with {}", cmp.current, cmp.other);
    let mut table = Table::new(&title, &["Direction", "Commits"]);
    table.row([format!("ahead of {}", cmp.other), cmp.ahead.to_string()]);
    table.row([format!("behind {}", cmp.other), cmp.behind.to_string()]);
    Report::new(&title, cmp, vec![table])
}

fn hotspot_table(files: &[FileChangeFrequency]) -> Table {
    let mut table = Table::new(
        "Most Modified Files",
        &["Path", "Changes", "Added", "Deleted", "Authors", "Owner", "Last modified"],
    );
    for f in files {
        table.row([
            f.path.clone(),
            f.changes.to_string(),
            f.additions.to_string(),
            f.deletions.to_string(),
            f.authors.len().to_string(),
            f.primary_owner.clone().unwrap_or_default(),
            f.last_modified.date_naive().to_string(),
        ]);
    }
    table
}

pub fn hotspots(files: &[FileChangeFrequency]) -> Result<Report> {
    Report::new("Most Modified Files", files, vec![hotspot_table(files)])
}

pub fn names(title: &str, names: &[String]) -> Result<Report> {
    let mut table = Table::new(title, &["Name"]);
    for n in names {
        table.row([n.clone()]);
    }
    Report::new(title, names, vec![table])
}
