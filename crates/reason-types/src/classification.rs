//! Classification outcomes and per-record results.
//!
//! Every text handed to the classifier produces exactly one
//! [`Classification`]. The assigned topic is always a taxonomy member;
//! when the model could not be used the fallback label is assigned and
//! [`ClassificationOutcome`] records why.

use serde::{Deserialize, Serialize};

use crate::registration::Registration;
use crate::taxonomy::TopicTaxonomy;

/// Confidence recorded when the model answered with a label outside the taxonomy.
pub const INVALID_TOPIC_CONFIDENCE: f64 = 0.3;

/// Confidence recorded when no usable answer was obtained.
pub const FAILURE_CONFIDENCE: f64 = 0.0;

/// Category of a hard classification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection, DNS or TLS failure
    Transport,
    /// Request exceeded its deadline
    Timeout,
    /// Endpoint answered with a non-success status
    HttpStatus,
    /// Endpoint answered 429
    RateLimited,
    /// Body or content could not be parsed into the expected shape
    MalformedResponse,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
            FailureKind::HttpStatus => "http_status",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::MalformedResponse => "malformed_response",
        };
        write!(f, "{}", s)
    }
}

/// How a classification was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// The model returned a valid taxonomy label
    Classified,
    /// The model answered, but `topic` was absent or not a taxonomy member
    InvalidTopic {
        /// The label the model actually returned, if any
        returned: Option<String>,
    },
    /// No usable answer was obtained
    Failed {
        failure: FailureKind,
        message: String,
    },
}

impl ClassificationOutcome {
    /// Short name used in logs and tallies.
    pub fn name(&self) -> &'static str {
        match self {
            ClassificationOutcome::Classified => "classified",
            ClassificationOutcome::InvalidTopic { .. } => "invalid_topic",
            ClassificationOutcome::Failed { .. } => "failed",
        }
    }
}

/// Topic and confidence assigned to a single text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Assigned taxonomy label
    pub topic: String,
    /// Confidence in [0.0, 1.0]
    pub confidence: f64,
    /// How the assignment was reached
    pub outcome: ClassificationOutcome,
}

impl Classification {
    /// A genuine model answer. Confidence is clamped into [0.0, 1.0].
    pub fn classified(topic: impl Into<String>, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            topic: topic.into(),
            confidence,
            outcome: ClassificationOutcome::Classified,
        }
    }

    /// The model's label was missing or not in the taxonomy.
    pub fn invalid_topic(taxonomy: &TopicTaxonomy, returned: Option<String>) -> Self {
        Self {
            topic: taxonomy.fallback().to_string(),
            confidence: INVALID_TOPIC_CONFIDENCE,
            outcome: ClassificationOutcome::InvalidTopic { returned },
        }
    }

    /// No usable answer could be obtained.
    pub fn failed(
        taxonomy: &TopicTaxonomy,
        failure: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            topic: taxonomy.fallback().to_string(),
            confidence: FAILURE_CONFIDENCE,
            outcome: ClassificationOutcome::Failed {
                failure,
                message: message.into(),
            },
        }
    }

    /// True when the fallback was substituted rather than chosen by the model.
    pub fn is_substituted(&self) -> bool {
        !matches!(self.outcome, ClassificationOutcome::Classified)
    }
}

/// Classification of one registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Registration identifier
    pub id: String,
    /// Original reason text
    pub reason: String,
    /// Assigned taxonomy label
    pub assigned_topic: String,
    /// Confidence in [0.0, 1.0]
    pub confidence: f64,
    /// How the assignment was reached
    pub outcome: ClassificationOutcome,
}

impl ClassificationResult {
    /// Pair a registration with its classification.
    pub fn new(registration: &Registration, classification: Classification) -> Self {
        Self {
            id: registration.id.clone(),
            reason: registration.reason.clone(),
            assigned_topic: classification.topic,
            confidence: classification.confidence,
            outcome: classification.outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classified_clamps_confidence() {
        assert_eq!(Classification::classified("Other", 1.7).confidence, 1.0);
        assert_eq!(Classification::classified("Other", -0.2).confidence, 0.0);
        assert_eq!(Classification::classified("Other", f64::NAN).confidence, 0.0);
        assert!((Classification::classified("Other", 0.42).confidence - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_topic_uses_fallback() {
        let taxonomy = TopicTaxonomy::default();
        let c = Classification::invalid_topic(&taxonomy, Some("Quantum Computing".to_string()));
        assert_eq!(c.topic, "Other");
        assert_eq!(c.confidence, INVALID_TOPIC_CONFIDENCE);
        assert!(c.is_substituted());
        assert_eq!(c.outcome.name(), "invalid_topic");
    }

    #[test]
    fn test_failed_uses_fallback() {
        let taxonomy = TopicTaxonomy::default();
        let c = Classification::failed(&taxonomy, FailureKind::Timeout, "deadline elapsed");
        assert_eq!(c.topic, "Other");
        assert_eq!(c.confidence, FAILURE_CONFIDENCE);
        assert!(matches!(
            c.outcome,
            ClassificationOutcome::Failed {
                failure: FailureKind::Timeout,
                ..
            }
        ));
    }

    #[test]
    fn test_result_from_registration() {
        let registration = Registration::new("u1", "Building an ML pipeline");
        let result = ClassificationResult::new(
            &registration,
            Classification::classified("AI/ML & GenAI", 0.9),
        );
        assert_eq!(result.id, "u1");
        assert_eq!(result.reason, "Building an ML pipeline");
        assert_eq!(result.assigned_topic, "AI/ML & GenAI");
        assert_eq!(result.outcome, ClassificationOutcome::Classified);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ClassificationOutcome::Failed {
            failure: FailureKind::RateLimited,
            message: "429".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains(r#""kind":"failed""#));
        assert!(json.contains(r#""failure":"rate_limited""#));
        let decoded: ClassificationOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, outcome);
    }
}
