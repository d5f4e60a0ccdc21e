//! Per-topic aggregates.

use serde::{Deserialize, Serialize};

/// Summary of all results assigned to one topic in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAggregate {
    /// Taxonomy label
    pub topic_label: String,
    /// Number of results assigned to this topic (never zero)
    pub count: u64,
    /// Most frequent keywords across the group's reasons, most frequent first
    pub representative_keywords: Vec<String>,
}

impl TopicAggregate {
    /// Create a new aggregate.
    pub fn new(
        topic_label: impl Into<String>,
        count: u64,
        representative_keywords: Vec<String>,
    ) -> Self {
        Self {
            topic_label: topic_label.into(),
            count,
            representative_keywords,
        }
    }

    /// Keywords rendered for the `top_words` column.
    pub fn top_words(&self) -> String {
        self.representative_keywords.join(", ")
    }
}
