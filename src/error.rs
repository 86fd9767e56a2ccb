//! # Structured Error Handling
//!
//! One error enum for the whole engine. Errors are classified (remote
//! unavailability, invalid lifecycle transitions, and so on) rather than
//! transported raw: no stack traces or backend error bodies cross the
//! coordinator boundary, only a kind and a short message.

use thiserror::Error;

/// Classified errors surfaced by the changeover engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChangeoverError {
    /// The remote step service could not be reached or rejected the call.
    #[error("Remote service unavailable during {operation}: {message}")]
    RemoteUnavailable { operation: String, message: String },

    /// A referenced step id is absent from the current step set.
    #[error("Step {step_id} not found in the current step set")]
    NotFound { step_id: i64 },

    /// A validation lifecycle rule was violated (local check, no remote call).
    #[error("Invalid transition: cannot apply '{event}' from state '{from}'")]
    InvalidTransition { from: String, event: String },

    /// A persisted record (rule table, session) could not be encoded/decoded.
    #[error("Serialization error in {context}: {message}")]
    Serialization { context: String, message: String },

    /// The embedded cache or key-value store failed.
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Invalid environment or configuration values.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The candidate step set carries a cyclic predecessor chain.
    #[error("Dependency cycle detected among steps {step_ids:?}")]
    DependencyCycle { step_ids: Vec<i64> },

    /// A session-scoped operation was requested with no session begun.
    #[error("No changeover session is active")]
    SessionNotActive,

    /// The coordinator task has shut down and can no longer serve requests.
    #[error("Coordinator is not running")]
    CoordinatorStopped,
}

impl ChangeoverError {
    /// Remote failure tagged with the operation that was in flight.
    pub fn remote_unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Serialization failure tagged with the record being handled.
    pub fn serialization(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// True when the error came from the remote boundary rather than a
    /// local rule or storage failure.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. })
    }
}

impl From<sqlx::Error> for ChangeoverError {
    fn from(err: sqlx::Error) -> Self {
        Self::Cache {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChangeoverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_and_message() {
        let err = ChangeoverError::remote_unavailable("validate", "connection refused");
        assert_eq!(
            err.to_string(),
            "Remote service unavailable during validate: connection refused"
        );
        assert!(err.is_remote());

        let err = ChangeoverError::NotFound { step_id: 42 };
        assert_eq!(err.to_string(), "Step 42 not found in the current step set");
        assert!(!err.is_remote());
    }
}
