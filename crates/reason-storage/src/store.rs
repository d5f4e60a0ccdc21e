//! Storage traits and row types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reason_types::{ClassificationResult, Registration, TopicAggregate};

use crate::error::StorageError;

/// Outcome of replacing one output relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    /// Target relation
    pub table: String,
    /// Rows the caller asked to write
    pub intended: usize,
    /// Rows actually inserted
    pub written: usize,
    /// Whether the previous contents were deleted
    pub cleared: bool,
}

impl WriteReport {
    pub fn new(table: impl Into<String>, intended: usize) -> Self {
        Self {
            table: table.into(),
            intended,
            written: 0,
            cleared: false,
        }
    }

    /// Rows that failed to insert.
    pub fn failed(&self) -> usize {
        self.intended - self.written
    }

    /// Every intended row was written.
    pub fn is_complete(&self) -> bool {
        self.written == self.intended
    }
}

/// A row of the assignments relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAssignment {
    pub user_id: String,
    pub assigned_topic: String,
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
}

/// A row of the aggregates relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAggregate {
    pub topic_label: String,
    pub topic_count: i64,
    /// Keywords joined with ", "
    pub top_words: String,
    pub updated_at: DateTime<Utc>,
}

/// Read access to registrations.
#[async_trait]
pub trait RegistrationSource: Send + Sync {
    /// Load every registration with a non-blank reason.
    async fn load_registrations(&self) -> Result<Vec<Registration>, StorageError>;
}

/// Write access to the two output relations.
#[async_trait]
pub trait TopicSink: Send + Sync {
    /// Delete all assignments, then insert one row per result.
    async fn replace_registration_topics(&self, results: &[ClassificationResult]) -> WriteReport;

    /// Delete all aggregates, then insert one row per aggregate.
    async fn replace_topic_aggregates(&self, aggregates: &[TopicAggregate]) -> WriteReport;

    /// Stored aggregates, highest count first.
    async fn load_topic_aggregates(&self) -> Result<Vec<StoredAggregate>, StorageError>;
}
