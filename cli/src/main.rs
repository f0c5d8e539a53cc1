//! gitnerds - contribution, activity and branch reports over git history
//!
//! Thin front end over `gitnerds-core`: flags become a history query, results are
//! rendered as text, JSON, CSV or Markdown.

mod cli;
mod report;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Diagnostics go to stderr so reports on stdout stay machine-readable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = cli::Cli::parse();
    cli::run(cli)
}
