//! Desired-state descriptors.
//!
//! A [`Descriptor`] is the typed desired configuration for one resource
//! instance: an identity plus an insertion-ordered map of field values.
//! It is immutable once built; any resource-specific validation happens
//! in the builder path of the concrete resource module, before the first
//! network call.

use crate::field::FieldValue;
use crate::state::RemoteState;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Desired configuration for one resource instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    identity: String,
    fields: IndexMap<String, FieldValue>,
}

impl Descriptor {
    /// Start building a descriptor for the resource with this identity.
    pub fn builder(identity: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            identity: identity.into(),
            fields: IndexMap::new(),
        }
    }

    /// Identity of the resource this descriptor configures (name, path,
    /// username, ...). Transitions address the adapter with exactly this
    /// value; identity is never inferred from remote data.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The desired value for a field (`Unset` when never declared).
    pub fn get(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&FieldValue::Unset)
    }

    /// Iterate over declared fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the observed remote state already satisfies this descriptor.
    ///
    /// Only managed fields are inspected and the comparison short-circuits
    /// on the first mismatch. Two asymmetries are intentional:
    ///
    /// - `Unset` fields never affect the result, whatever the remote holds.
    /// - A managed field the remote representation does not report at all
    ///   is skipped rather than treated as a mismatch, so descriptors stay
    ///   usable against partial representations.
    ///
    /// `NotFound` never matches.
    pub fn matches(&self, remote: &RemoteState) -> bool {
        let RemoteState::Found(actual) = remote else {
            return false;
        };

        for (name, desired) in &self.fields {
            if !desired.is_managed() {
                continue;
            }

            let Some(actual_value) = actual.get(name) else {
                continue;
            };

            if !desired.is_satisfied_by(actual_value) {
                log::debug!("field '{name}' differs from desired value");
                return false;
            }
        }

        true
    }

    /// The outgoing payload for create calls: managed fields only, with
    /// `ExplicitNull` emitted as JSON null. `Unset` fields are never
    /// transmitted, so unmanaged remote fields cannot be clobbered.
    pub fn payload(&self) -> Map<String, Value> {
        self.payload_without(&[])
    }

    /// The payload with the named fields stripped; used for edit calls,
    /// where create-only fields are not legal.
    pub fn payload_without(&self, exclude: &[&str]) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(name, _)| !exclude.contains(&name.as_str()))
            .filter_map(|(name, field)| field.as_payload().map(|v| (name.clone(), v)))
            .collect()
    }
}

/// Builder for [`Descriptor`].
#[derive(Debug)]
pub struct DescriptorBuilder {
    identity: String,
    fields: IndexMap<String, FieldValue>,
}

impl DescriptorBuilder {
    /// Declare a field with an explicit [`FieldValue`].
    pub fn field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Declare a `Present` field.
    pub fn set(self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.field(name, FieldValue::value(value))
    }

    /// Declare a field from optional caller input (`None` stays unmanaged).
    pub fn opt(self, name: impl Into<String>, value: Option<impl Serialize>) -> Self {
        self.field(name, FieldValue::from_option(value))
    }

    /// Declare fields the caller wants cleared.
    ///
    /// A clear overrides an earlier `Unset` declaration for the same name
    /// but never a concrete value, so "set and clear the same field" cannot
    /// silently drop the value.
    pub fn clear_all(mut self, names: &[String]) -> Self {
        for name in names {
            match self.fields.get(name) {
                Some(FieldValue::Present(_)) | Some(FieldValue::ExplicitNull) => {}
                _ => {
                    self.fields.insert(name.clone(), FieldValue::ExplicitNull);
                }
            }
        }
        self
    }

    /// Finish building.
    pub fn build(self) -> Descriptor {
        Descriptor {
            identity: self.identity,
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn label_descriptor() -> Descriptor {
        Descriptor::builder("bug")
            .set("name", "bug")
            .set("color", "ff0000")
            .opt("description", None::<&str>)
            .build()
    }

    #[test]
    fn test_matches_identical_remote() {
        let desc = label_descriptor();
        let remote = RemoteState::found(json!({"name": "bug", "color": "ff0000"}));
        assert!(desc.matches(&remote));
    }

    #[test]
    fn test_matches_short_circuits_on_mismatch() {
        let desc = label_descriptor();
        let remote = RemoteState::found(json!({"name": "bug", "color": "00ff00"}));
        assert!(!desc.matches(&remote));
    }

    #[test]
    fn test_not_found_never_matches() {
        assert!(!label_descriptor().matches(&RemoteState::NotFound));
    }

    #[test]
    fn test_unset_fields_never_affect_matching() {
        let desc = label_descriptor();
        // "description" is Unset; whatever the remote reports must not matter.
        for value in [json!("anything"), Value::Null, json!(42)] {
            let remote = RemoteState::found(json!({
                "name": "bug",
                "color": "ff0000",
                "description": value,
            }));
            assert!(desc.matches(&remote));
        }
    }

    #[test]
    fn test_fields_missing_from_remote_are_skipped() {
        let desc = label_descriptor();
        // Partial remote representation without "color".
        let remote = RemoteState::found(json!({"name": "bug"}));
        assert!(desc.matches(&remote));
    }

    #[test]
    fn test_explicit_null_matching() {
        let desc = Descriptor::builder("bug")
            .set("name", "bug")
            .field("description", FieldValue::ExplicitNull)
            .build();

        let cleared = RemoteState::found(json!({"name": "bug", "description": null}));
        assert!(desc.matches(&cleared));

        let set = RemoteState::found(json!({"name": "bug", "description": "old"}));
        assert!(!desc.matches(&set));
    }

    #[test]
    fn test_payload_excludes_unset() {
        let payload = label_descriptor().payload();
        assert_eq!(payload.get("name"), Some(&json!("bug")));
        assert_eq!(payload.get("color"), Some(&json!("ff0000")));
        assert!(!payload.contains_key("description"));
    }

    #[test]
    fn test_payload_emits_explicit_null() {
        let desc = Descriptor::builder("bug")
            .set("name", "bug")
            .field("description", FieldValue::ExplicitNull)
            .build();
        let payload = desc.payload();
        assert_eq!(payload.get("description"), Some(&Value::Null));
    }

    #[test]
    fn test_payload_without_strips_create_only_fields() {
        let payload = label_descriptor().payload_without(&["name"]);
        assert!(!payload.contains_key("name"));
        assert_eq!(payload.get("color"), Some(&json!("ff0000")));
    }

    #[test]
    fn test_clear_all_does_not_override_concrete_values() {
        let desc = Descriptor::builder("bug")
            .set("color", "ff0000")
            .opt("description", None::<&str>)
            .clear_all(&["color".to_string(), "description".to_string()])
            .build();

        assert_eq!(desc.get("color"), &FieldValue::Present(json!("ff0000")));
        assert_eq!(desc.get("description"), &FieldValue::ExplicitNull);
    }

    #[test]
    fn test_field_order_is_preserved() {
        let desc = Descriptor::builder("x")
            .set("zebra", 1)
            .set("alpha", 2)
            .build();
        let names: Vec<&str> = desc.fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zebra", "alpha"]);
    }
}
