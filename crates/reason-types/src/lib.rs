//! # reason-types
//!
//! Core types for the registration topic pipeline.
//!
//! This crate defines the fundamental data structures shared by every
//! other crate in the workspace:
//! - Registrations read from the source relation
//! - Classification outcomes and per-record results
//! - The closed topic taxonomy with its fallback member
//! - Per-topic aggregates
//! - Layered settings
//!
//! ## Usage
//!
//! ```rust
//! use reason_types::{Registration, TopicTaxonomy};
//!
//! let taxonomy = TopicTaxonomy::default();
//! assert!(taxonomy.contains("AI/ML & GenAI"));
//!
//! let registration = Registration::new("u1", "Building an ML pipeline");
//! assert!(registration.has_reason());
//! ```

pub mod aggregate;
pub mod classification;
pub mod config;
pub mod error;
pub mod registration;
pub mod taxonomy;

pub use aggregate::TopicAggregate;
pub use classification::{
    Classification, ClassificationOutcome, ClassificationResult, FailureKind,
    FAILURE_CONFIDENCE, INVALID_TOPIC_CONFIDENCE,
};
pub use config::{
    ClassifierSettings, DatabaseSettings, PipelineSettings, Settings, TableSettings,
    TaxonomySettings,
};
pub use error::TypesError;
pub use registration::Registration;
pub use taxonomy::{TopicTaxonomy, DEFAULT_FALLBACK, DEFAULT_TOPICS};
