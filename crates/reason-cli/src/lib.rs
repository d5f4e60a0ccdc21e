//! Command-line front end for the registration topic pipeline.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (run, classify, topics)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{classify_text, init_logging, load_settings, run_pipeline, show_topics};
