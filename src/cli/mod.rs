//! Command-line interface for shelf-minder.
//!
//! This module provides CLI commands for managing the library and for
//! triggering the enrichment jobs from a scheduler.

mod commands;

pub use commands::{Cli, Commands, run_command};
