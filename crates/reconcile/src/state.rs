//! Observed remote state and transition outcomes.

use serde::Serialize;
use serde_json::{Map, Value};

/// Last-observed state of a remote resource.
///
/// "Does not exist" is a normal observation, not an error, so transitions
/// can take it as input without unwinding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RemoteState {
    /// The resource exists with this representation.
    Found(Map<String, Value>),
    /// The resource does not exist.
    #[default]
    NotFound,
}

impl RemoteState {
    /// Build a found state from any JSON value, treating non-objects as
    /// an empty representation.
    pub fn found(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Found(map),
            _ => Self::Found(Map::new()),
        }
    }

    /// Whether the resource exists.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Look up a field of the remote representation.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Found(map) => map.get(name),
            Self::NotFound => None,
        }
    }

    /// The remote representation as a JSON value (`null` when not found).
    pub fn to_value(&self) -> Value {
        match self {
            Self::Found(map) => Value::Object(map.clone()),
            Self::NotFound => Value::Null,
        }
    }
}

/// Result of one reconciliation transition.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Whether the transition changed (or, under check mode, would have
    /// changed) the remote resource.
    pub changed: bool,
    /// The resulting resource representation: remote state after apply, or
    /// the unapplied descriptor payload for a simulated create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
    /// Optional human-readable note, e.g. why nothing happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    /// An outcome that changed nothing.
    pub fn unchanged(resource: Option<Value>) -> Self {
        Self {
            changed: false,
            resource,
            message: None,
        }
    }

    /// An outcome that changed (or would change) the resource.
    pub fn changed(resource: Option<Value>) -> Self {
        Self {
            changed: true,
            resource,
            message: None,
        }
    }

    /// Attach a message to this outcome.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_found_is_not_found() {
        assert!(!RemoteState::NotFound.is_found());
        assert_eq!(RemoteState::NotFound.get("name"), None);
        assert_eq!(RemoteState::NotFound.to_value(), Value::Null);
    }

    #[test]
    fn test_found_lookup() {
        let remote = RemoteState::found(json!({"name": "bug", "color": "ff0000"}));
        assert!(remote.is_found());
        assert_eq!(remote.get("color"), Some(&json!("ff0000")));
        assert_eq!(remote.get("missing"), None);
    }

    #[test]
    fn test_found_from_non_object() {
        // Arrays and scalars carry no comparable fields.
        let remote = RemoteState::found(json!([1, 2, 3]));
        assert!(remote.is_found());
        assert_eq!(remote.get("anything"), None);
    }

    #[test]
    fn test_outcome_serialization_skips_empty_fields() {
        let outcome = Outcome::unchanged(None);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({"changed": false}));

        let outcome = Outcome::changed(Some(json!({"name": "bug"}))).with_message("created");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({"changed": true, "resource": {"name": "bug"}, "message": "created"})
        );
    }
}
