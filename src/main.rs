//! Shelf Minder - a personal book-library manager.
//!
//! Keeps a SQLite library of books and enriches it in the background:
//! AI-generated summaries and external ratings, fetched from rate-limited
//! third-party services under strict per-run budgets. Designed to be
//! driven from a scheduler (cron or similar) via the CLI commands.

pub mod cli;
pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod model;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("shelf_minder=info".parse().unwrap()))
        .init();

    cli::run_command(&args)
}
