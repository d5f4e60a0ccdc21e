//! Source records.

use serde::{Deserialize, Serialize};

/// A single registration row read from the source relation.
///
/// The identifier is opaque; the pipeline never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Opaque identifier (user id in the source relation)
    pub id: String,
    /// Free-text reason for registering
    pub reason: String,
}

impl Registration {
    /// Create a new registration.
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the reason carries any non-whitespace text.
    ///
    /// Records without a reason are dropped before classification.
    pub fn has_reason(&self) -> bool {
        !self.reason.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_reason() {
        assert!(Registration::new("u1", "Building an ML pipeline").has_reason());
        assert!(!Registration::new("u2", "").has_reason());
        assert!(!Registration::new("u3", "   \n\t").has_reason());
    }

    #[test]
    fn test_serialization() {
        let registration = Registration::new("u1", "Lakehouse migration");
        let json = serde_json::to_string(&registration).unwrap();
        let decoded: Registration = serde_json::from_str(&json).unwrap();
        assert_eq!(registration, decoded);
    }
}
