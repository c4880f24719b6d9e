//! Error types for reconciliation operations.
//!
//! "Resource does not exist" is deliberately not represented here; it is a
//! normal transition input carried by [`crate::state::RemoteState::NotFound`].

use thiserror::Error;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a descriptor or driving a transition.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A descriptor field failed validation before any remote call was made.
    #[error("invalid value for '{field}': {message}")]
    Validation {
        /// Name of the offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// The remote API rejected a call (anything but "not found").
    ///
    /// Carries the HTTP status and the raw response body so the boundary
    /// can report exactly what the server said. Never retried internally.
    #[error("remote API error [{status}]: {body}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The request never produced a response (DNS, TLS, socket, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The requested state/mode combination is not implemented for this
    /// resource type. Raised deterministically before any adapter call.
    #[error("unsupported operation for {kind}: {operation}")]
    Unsupported {
        /// Resource type, e.g. "label".
        kind: String,
        /// Offending operation, e.g. "state 'archived'".
        operation: String,
    },
}

impl Error {
    /// Create a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error for an unknown state name.
    pub fn unsupported_state(kind: impl Into<String>, state: &str) -> Self {
        Self::Unsupported {
            kind: kind.into(),
            operation: format!("state '{state}'"),
        }
    }

    /// Create an unsupported-operation error for a state that cannot be
    /// previewed under check mode.
    pub fn unsupported_check_mode(kind: impl Into<String>, state: &str) -> Self {
        Self::Unsupported {
            kind: kind.into(),
            operation: format!("check mode for state '{state}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = Error::validation("color", "must be a 6 digit hex code");
        assert_eq!(
            err.to_string(),
            "invalid value for 'color': must be a 6 digit hex code"
        );
    }

    #[test]
    fn test_remote_display_carries_status_and_body() {
        let err = Error::Remote {
            status: 422,
            body: "{\"message\":\"Validation Failed\"}".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("422"));
        assert!(text.contains("Validation Failed"));
    }

    #[test]
    fn test_unsupported_state_display() {
        let err = Error::unsupported_state("label", "archived");
        assert_eq!(
            err.to_string(),
            "unsupported operation for label: state 'archived'"
        );
    }

    #[test]
    fn test_unsupported_check_mode_display() {
        let err = Error::unsupported_check_mode("secret", "present");
        assert_eq!(
            err.to_string(),
            "unsupported operation for secret: check mode for state 'present'"
        );
    }
}
