//! CLI argument parsing.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

/// Registration topic pipeline
///
/// Classifies free-text registration reasons into topics and stores
/// per-registration assignments and per-topic aggregates.
#[derive(Parser, Debug)]
#[command(name = "reason-topics")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify all registrations and replace the output tables
    Run {
        /// Classify and aggregate without writing to the database
        #[arg(long)]
        dry_run: bool,

        /// Classification calls in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Classify a single text and print the result
    Classify {
        /// Text to classify
        text: String,
    },

    /// Show the stored topic analysis
    Topics,
}
