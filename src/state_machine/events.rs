use serde::{Deserialize, Serialize};

/// Events that can trigger step lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ValidationEvent {
    /// Validate the step, recording the operator comment and the actual
    /// elapsed time. The description travels to the remote source only.
    Validate {
        comment: String,
        description: String,
        elapsed_secs: i64,
    },
    /// Revert a validated step to pending; elapsed time resets to 0.
    Invalidate,
}

impl ValidationEvent {
    /// Get a string representation of the event type for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Validate { .. } => "validate",
            Self::Invalidate => "invalidate",
        }
    }

    /// Create a validation event.
    pub fn validate(
        comment: impl Into<String>,
        description: impl Into<String>,
        elapsed_secs: i64,
    ) -> Self {
        Self::Validate {
            comment: comment.into(),
            description: description.into(),
            elapsed_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        assert_eq!(ValidationEvent::validate("ok", "", 42).event_type(), "validate");
        assert_eq!(ValidationEvent::Invalidate.event_type(), "invalidate");
    }

    #[test]
    fn test_event_serde_is_tagged() {
        let event = ValidationEvent::validate("ok", "swap die", 42);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Validate\""));
        let parsed: ValidationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
