//! Pipeline error types.

use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// Classification and per-row write failures are recovered where they
/// happen; only an unusable source ends the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] reason_storage::StorageError),
}
