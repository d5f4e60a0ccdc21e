//! The closed topic taxonomy.

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Topic labels used when no taxonomy is configured.
pub const DEFAULT_TOPICS: &[&str] = &[
    "AI/ML & GenAI",
    "Data Engineering & ETL",
    "Data Warehousing & Analytics",
    "Platform Evaluation & Migration",
    "Building Apps & Startups",
    "Data Governance & Security",
    "Learning & Education",
    "Other",
];

/// Catch-all label of the default taxonomy.
pub const DEFAULT_FALLBACK: &str = "Other";

/// A fixed, closed set of topic labels plus one designated fallback.
///
/// Membership checks are exact and case-sensitive. A taxonomy can only be
/// constructed through [`TopicTaxonomy::new`], so every instance upholds:
/// - at least one label
/// - no empty or duplicate labels
/// - the fallback is itself a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTaxonomy")]
pub struct TopicTaxonomy {
    topics: Vec<String>,
    fallback: String,
}

#[derive(Deserialize)]
struct RawTaxonomy {
    topics: Vec<String>,
    fallback: String,
}

impl TryFrom<RawTaxonomy> for TopicTaxonomy {
    type Error = TypesError;

    fn try_from(raw: RawTaxonomy) -> Result<Self, Self::Error> {
        Self::new(raw.topics, raw.fallback)
    }
}

impl TopicTaxonomy {
    /// Build a validated taxonomy.
    pub fn new<I, S>(topics: I, fallback: impl Into<String>) -> Result<Self, TypesError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        let fallback = fallback.into();

        if topics.is_empty() {
            return Err(TypesError::InvalidTaxonomy(
                "taxonomy must contain at least one topic".to_string(),
            ));
        }

        for (i, topic) in topics.iter().enumerate() {
            if topic.trim().is_empty() {
                return Err(TypesError::InvalidTaxonomy(format!(
                    "topic at position {} is empty",
                    i
                )));
            }
            if topics[..i].contains(topic) {
                return Err(TypesError::InvalidTaxonomy(format!(
                    "duplicate topic '{}'",
                    topic
                )));
            }
        }

        if !topics.contains(&fallback) {
            return Err(TypesError::InvalidTaxonomy(format!(
                "fallback '{}' is not one of the configured topics",
                fallback
            )));
        }

        Ok(Self { topics, fallback })
    }

    /// All labels in configured order.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// The catch-all label.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Exact membership check.
    pub fn contains(&self, label: &str) -> bool {
        self.topics.iter().any(|t| t == label)
    }

    /// Return the taxonomy's own copy of `label` if it is a member.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.topics
            .iter()
            .find(|t| t.as_str() == label)
            .map(String::as_str)
    }

    /// Number of labels, fallback included.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Always false for a constructed taxonomy.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl Default for TopicTaxonomy {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }
}
