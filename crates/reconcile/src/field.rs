//! Three-valued field semantics for desired state.
//!
//! A desired-state field is either managed with a concrete value, managed
//! and explicitly cleared, or not managed at all. The distinction matters:
//! an unmanaged field must never show up in a diff or an outgoing payload,
//! while an explicit clear is a real instruction to the remote API.

use serde::Serialize;
use serde_json::Value;

/// Desired value for a single field of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    /// The caller wants the field to hold this value.
    Present(Value),
    /// The caller wants the field cleared (transmitted as JSON null).
    ExplicitNull,
    /// The caller expressed no opinion. Excluded from comparison and
    /// from outgoing payloads.
    #[default]
    Unset,
}

impl FieldValue {
    /// Whether this field participates in comparison and payloads.
    pub fn is_managed(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// The value to transmit, or `None` for an unmanaged field.
    pub fn as_payload(&self) -> Option<Value> {
        match self {
            Self::Present(value) => Some(value.clone()),
            Self::ExplicitNull => Some(Value::Null),
            Self::Unset => None,
        }
    }

    /// Whether a remote value satisfies this field.
    ///
    /// `Unset` is satisfied by anything. `ExplicitNull` is satisfied by a
    /// JSON null (a field the remote does not report at all is handled one
    /// level up, by the descriptor).
    pub fn is_satisfied_by(&self, remote: &Value) -> bool {
        match self {
            Self::Present(value) => value == remote,
            Self::ExplicitNull => remote.is_null(),
            Self::Unset => true,
        }
    }

    /// Build a field from an optional caller input: `None` means the caller
    /// omitted the field, so it stays unmanaged.
    pub fn from_option<T: Serialize>(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::value(v),
            None => Self::Unset,
        }
    }

    /// Build a `Present` field from any serializable value.
    ///
    /// Serialization of plain strings, booleans and numbers cannot fail;
    /// a failure here would indicate a non-JSON-representable type and is
    /// mapped to `Unset` rather than panicking.
    pub fn value<T: Serialize>(value: T) -> Self {
        serde_json::to_value(value).map_or(Self::Unset, Self::Present)
    }
}

impl From<Option<FieldValue>> for FieldValue {
    fn from(value: Option<FieldValue>) -> Self {
        value.unwrap_or(Self::Unset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_is_not_managed() {
        assert!(!FieldValue::Unset.is_managed());
        assert!(FieldValue::ExplicitNull.is_managed());
        assert!(FieldValue::Present(json!("x")).is_managed());
    }

    #[test]
    fn test_payload_values() {
        assert_eq!(FieldValue::Unset.as_payload(), None);
        assert_eq!(FieldValue::ExplicitNull.as_payload(), Some(Value::Null));
        assert_eq!(
            FieldValue::Present(json!("ff0000")).as_payload(),
            Some(json!("ff0000"))
        );
    }

    #[test]
    fn test_unset_satisfied_by_anything() {
        assert!(FieldValue::Unset.is_satisfied_by(&json!("whatever")));
        assert!(FieldValue::Unset.is_satisfied_by(&Value::Null));
        assert!(FieldValue::Unset.is_satisfied_by(&json!(42)));
    }

    #[test]
    fn test_explicit_null_only_satisfied_by_null() {
        assert!(FieldValue::ExplicitNull.is_satisfied_by(&Value::Null));
        assert!(!FieldValue::ExplicitNull.is_satisfied_by(&json!("")));
    }

    #[test]
    fn test_present_compares_by_value() {
        let field = FieldValue::Present(json!(true));
        assert!(field.is_satisfied_by(&json!(true)));
        assert!(!field.is_satisfied_by(&json!(false)));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(FieldValue::from_option::<&str>(None), FieldValue::Unset);
        assert_eq!(
            FieldValue::from_option(Some("bug")),
            FieldValue::Present(json!("bug"))
        );
    }
}
