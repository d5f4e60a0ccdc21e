//! Error types for the reason-topics system.

use thiserror::Error;

/// Errors raised while building or validating core types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Taxonomy is not a valid closed set
    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),
}
