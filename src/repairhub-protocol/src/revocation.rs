//! Revocation signal broadcast between tabs.

use serde::{Deserialize, Serialize};

/// A broadcast record announcing that an account's sessions are invalid.
///
/// Written once by an administrative action into the shared revocation
/// slot; read by zero or more sibling tabs. The slot is never deleted -
/// new signals overwrite it, and subscribers deduplicate on `issued_at_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationSignal {
    /// Identifier of the account being revoked.
    #[serde(rename = "userId")]
    pub target_subject: String,
    /// Unix milliseconds when the signal was issued. Used for
    /// deduplication and ordering.
    #[serde(rename = "timestamp")]
    pub issued_at_ms: i64,
}

impl RevocationSignal {
    /// Create a signal stamped with the current wall clock.
    pub fn now(target_subject: impl Into<String>) -> Self {
        Self {
            target_subject: target_subject.into(),
            issued_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether this signal targets the given subject.
    pub fn targets(&self, subject: &str) -> bool {
        self.target_subject == subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_field_names() {
        let signal = RevocationSignal {
            target_subject: "user-9".to_string(),
            issued_at_ms: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["userId"], "user-9");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_targeting() {
        let signal = RevocationSignal::now("user-9");
        assert!(signal.targets("user-9"));
        assert!(!signal.targets("user-10"));
    }
}
