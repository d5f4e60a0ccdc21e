//! In-memory store.
//!
//! Mirrors the PostgreSQL store's semantics, including logged-and-skipped
//! row failures, so pipelines can be exercised without a database. Used by
//! dry runs and tests.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use reason_types::{ClassificationResult, Registration, TopicAggregate};

use crate::error::StorageError;
use crate::store::{RegistrationSource, StoredAggregate, StoredAssignment, TopicSink, WriteReport};

const ASSIGNMENTS_TABLE: &str = "memory.registration_topics";
const AGGREGATES_TABLE: &str = "memory.topic_analysis";

/// Store holding all three relations in memory.
#[derive(Default)]
pub struct MemoryStore {
    registrations: RwLock<Vec<Registration>>,
    assignments: RwLock<Vec<StoredAssignment>>,
    aggregates: RwLock<Vec<StoredAggregate>>,
    /// User ids or topic labels whose inserts fail
    failing_keys: HashSet<String>,
    /// Simulate output tables that do not exist yet
    clear_fails: bool,
    /// Simulate an unreachable source
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the source relation.
    pub fn with_registrations<I>(self, registrations: I) -> Self
    where
        I: IntoIterator<Item = Registration>,
    {
        *self
            .registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner) = registrations.into_iter().collect();
        self
    }

    /// Make inserts for this user id or topic label fail.
    pub fn fail_inserts_for(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.insert(key.into());
        self
    }

    /// Make clears fail, as when the output tables have not been created.
    pub fn with_failing_clear(mut self) -> Self {
        self.clear_fails = true;
        self
    }

    /// Make the source unreachable.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Current contents of the assignments relation.
    pub fn assignments(&self) -> Vec<StoredAssignment> {
        self.assignments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current contents of the aggregates relation, in insertion order.
    pub fn aggregates(&self) -> Vec<StoredAggregate> {
        self.aggregates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear<T>(&self, table: &str, rows: &mut Vec<T>) -> bool {
        if self.clear_fails {
            info!(table, "Clear failed (table may not exist yet)");
            return false;
        }
        rows.clear();
        true
    }
}

#[async_trait]
impl RegistrationSource for MemoryStore {
    async fn load_registrations(&self) -> Result<Vec<Registration>, StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable(
                "memory source marked unavailable".to_string(),
            ));
        }
        Ok(self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.has_reason())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TopicSink for MemoryStore {
    async fn replace_registration_topics(&self, results: &[ClassificationResult]) -> WriteReport {
        let mut report = WriteReport::new(ASSIGNMENTS_TABLE, results.len());
        let updated_at = Utc::now();
        let mut rows = self
            .assignments
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        report.cleared = self.clear(ASSIGNMENTS_TABLE, &mut rows);

        for result in results {
            if self.failing_keys.contains(&result.id) {
                warn!(user_id = %result.id, "Failed to insert topic assignment");
                continue;
            }
            rows.push(StoredAssignment {
                user_id: result.id.clone(),
                assigned_topic: result.assigned_topic.clone(),
                confidence: result.confidence,
                updated_at,
            });
            report.written += 1;
        }

        report
    }

    async fn replace_topic_aggregates(&self, aggregates: &[TopicAggregate]) -> WriteReport {
        let mut report = WriteReport::new(AGGREGATES_TABLE, aggregates.len());
        let updated_at = Utc::now();
        let mut rows = self
            .aggregates
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        report.cleared = self.clear(AGGREGATES_TABLE, &mut rows);

        for aggregate in aggregates {
            if self.failing_keys.contains(&aggregate.topic_label) {
                warn!(topic = %aggregate.topic_label, "Failed to insert topic aggregate");
                continue;
            }
            rows.push(StoredAggregate {
                topic_label: aggregate.topic_label.clone(),
                topic_count: aggregate.count as i64,
                top_words: aggregate.top_words(),
                updated_at,
            });
            report.written += 1;
        }

        report
    }

    async fn load_topic_aggregates(&self) -> Result<Vec<StoredAggregate>, StorageError> {
        let mut rows = self.aggregates();
        rows.sort_by(|a, b| {
            b.topic_count
                .cmp(&a.topic_count)
                .then_with(|| a.topic_label.cmp(&b.topic_label))
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reason_types::Classification;

    fn result(id: &str, topic: &str) -> ClassificationResult {
        ClassificationResult::new(
            &Registration::new(id, "reason"),
            Classification::classified(topic, 0.8),
        )
    }

    fn comparable(rows: &[StoredAggregate]) -> Vec<(String, i64, String)> {
        rows.iter()
            .map(|r| (r.topic_label.clone(), r.topic_count, r.top_words.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_load_filters_blank_reasons() {
        let store = MemoryStore::new().with_registrations([
            Registration::new("u1", "Building an ML pipeline"),
            Registration::new("u2", ""),
            Registration::new("u3", "  "),
        ]);
        let loaded = store.load_registrations().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "u1");
    }

    #[tokio::test]
    async fn test_unavailable_source() {
        let store = MemoryStore::new().unavailable();
        assert!(matches!(
            store.load_registrations().await,
            Err(StorageError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_discards_previous_rows() {
        let store = MemoryStore::new();
        store
            .replace_registration_topics(&[result("u1", "A"), result("u2", "B")])
            .await;
        let report = store.replace_registration_topics(&[result("u3", "C")]).await;

        assert!(report.cleared);
        assert!(report.is_complete());
        let rows = store.assignments();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "u3");
    }

    #[tokio::test]
    async fn test_row_failure_does_not_abort() {
        let store = MemoryStore::new().fail_inserts_for("u2");
        let report = store
            .replace_registration_topics(&[result("u1", "A"), result("u2", "A"), result("u3", "B")])
            .await;
        assert_eq!(report.intended, 3);
        assert_eq!(report.written, 2);
        assert_eq!(report.failed(), 1);
        let ids: Vec<String> = store.assignments().into_iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec!["u1", "u3"]);
    }

    #[tokio::test]
    async fn test_clear_failure_continues() {
        let store = MemoryStore::new().with_failing_clear();
        let report = store
            .replace_topic_aggregates(&[TopicAggregate::new("A", 1, vec![])])
            .await;
        assert!(!report.cleared);
        assert_eq!(report.written, 1);
    }

    #[tokio::test]
    async fn test_replace_aggregates_idempotent() {
        let store = MemoryStore::new();
        let aggregates = vec![
            TopicAggregate::new("AI/ML & GenAI", 2, vec!["agents".to_string()]),
            TopicAggregate::new("Other", 1, vec![]),
        ];

        store.replace_topic_aggregates(&aggregates).await;
        let once = comparable(&store.aggregates());
        store.replace_topic_aggregates(&aggregates).await;
        let twice = comparable(&store.aggregates());

        assert_eq!(once, twice);
        assert_eq!(once[0], ("AI/ML & GenAI".to_string(), 2, "agents".to_string()));
    }

    #[tokio::test]
    async fn test_load_aggregates_sorted() {
        let store = MemoryStore::new();
        store
            .replace_topic_aggregates(&[
                TopicAggregate::new("B", 1, vec![]),
                TopicAggregate::new("A", 3, vec![]),
                TopicAggregate::new("C", 1, vec![]),
            ])
            .await;
        let labels: Vec<String> = store
            .load_topic_aggregates()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.topic_label)
            .collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
    }
}
