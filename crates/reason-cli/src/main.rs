//! Registration topic pipeline
//!
//! Classifies registration reasons into a fixed topic taxonomy and
//! replaces the per-registration and per-topic output tables.
//!
//! # Usage
//!
//! ```bash
//! reason-topics run [--dry-run] [--concurrency N]
//! reason-topics classify "Evaluating a lakehouse migration"
//! reason-topics topics
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (<config dir>/reason-topics/config.toml)
//! 3. `--config` file
//! 4. Environment variables (REASON_TOPICS_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use reason_cli::{classify_text, load_settings, run_pipeline, show_topics, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref())?;
    reason_cli::init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Run {
            dry_run,
            concurrency,
        } => {
            if let Some(concurrency) = concurrency {
                settings.pipeline.concurrency = concurrency;
            }
            run_pipeline(&settings, dry_run).await?;
        }
        Commands::Classify { text } => {
            classify_text(&settings, &text).await?;
        }
        Commands::Topics => {
            show_topics(&settings).await?;
        }
    }

    Ok(())
}
