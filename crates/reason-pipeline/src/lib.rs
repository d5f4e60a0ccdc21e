//! # reason-pipeline
//!
//! Batch orchestration: read registrations, classify each one, aggregate
//! by topic, and replace both output relations.
//!
//! ## Components
//! - [`BatchRunner`]: one classification per record, results in input order
//! - [`TopicPipeline`]: source -> runner -> aggregator -> sink

pub mod error;
pub mod pipeline;
pub mod runner;

pub use error::PipelineError;
pub use pipeline::{OutcomeTally, RunReport, TopicPipeline};
pub use runner::BatchRunner;
