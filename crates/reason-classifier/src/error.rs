//! Classifier error types.

use thiserror::Error;

use reason_types::FailureKind;

/// Errors raised while talking to the completion endpoint or reading its answer.
///
/// These never escape [`Classifier::classify`](crate::Classifier::classify);
/// they are converted into a fallback classification there.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClassifierError {
    /// Outcome tag recorded on the fallback classification.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ClassifierError::Transport(_) | ClassifierError::Config(_) => FailureKind::Transport,
            ClassifierError::Timeout => FailureKind::Timeout,
            ClassifierError::RateLimited => FailureKind::RateLimited,
            ClassifierError::HttpStatus { .. } => FailureKind::HttpStatus,
            ClassifierError::Parse(_) => FailureKind::MalformedResponse,
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClassifierError::Transport(_)
            | ClassifierError::Timeout
            | ClassifierError::RateLimited => true,
            ClassifierError::HttpStatus { status, .. } => *status >= 500,
            ClassifierError::Parse(_) | ClassifierError::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClassifierError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClassifierError::Timeout
        } else if e.is_decode() {
            ClassifierError::Parse(e.to_string())
        } else {
            ClassifierError::Transport(e.to_string())
        }
    }
}
