//! Adapter trait for remote resource APIs.
//!
//! This is the boundary between the generic transitions and a concrete
//! remote API. Implementations are synchronous and perform exactly the
//! requested call; retry, pagination and rate limiting are out of scope.
//!
//! # Testing
//!
//! Use [`MockAdapter`] to drive transitions without network access:
//!
//! ```
//! use reconcile::{MockAdapter, ResourceAdapter, RemoteState};
//! use serde_json::json;
//!
//! let mock = MockAdapter::with_remote(json!({"name": "bug", "color": "ff0000"}));
//! assert!(mock.find("bug").unwrap().is_found());
//! ```

use crate::error::{Error, Result};
use crate::state::RemoteState;
use serde_json::{Map, Value};
use std::sync::Mutex;

/// Contract the transitions require from a remote resource API,
/// independent of resource type.
///
/// An adapter instance is bound to its surrounding context (owner,
/// repository, endpoint) at construction; per-call identity is the
/// resource key within that context.
pub trait ResourceAdapter {
    /// Fetch the resource, returning [`RemoteState::NotFound`] when it
    /// does not exist. Only genuine transport or API failures are errors.
    fn find(&self, id: &str) -> Result<RemoteState>;

    /// Create the resource from a payload and return its representation.
    fn create(&self, payload: &Map<String, Value>) -> Result<Value>;

    /// Edit the resource toward the payload and return the updated
    /// representation.
    fn edit(&self, id: &str, payload: &Map<String, Value>) -> Result<Value>;

    /// Delete the resource. Returns `false` when there was nothing to
    /// delete.
    fn delete(&self, id: &str) -> Result<bool>;
}

/// One recorded call against a [`MockAdapter`].
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    /// `find(id)`
    Find(String),
    /// `create(payload)`
    Create(Map<String, Value>),
    /// `edit(id, payload)`
    Edit(String, Map<String, Value>),
    /// `delete(id)`
    Delete(String),
}

impl AdapterCall {
    /// Whether this call mutates remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Find(_))
    }
}

/// In-memory adapter for tests.
///
/// Holds a single remote state, records every call, and can be scripted
/// to fail with a remote error. Create and edit update the held state so
/// idempotence tests can run two transitions back to back.
#[derive(Debug, Default)]
pub struct MockAdapter {
    remote: Mutex<RemoteState>,
    calls: Mutex<Vec<AdapterCall>>,
    fail: Mutex<Option<(u16, String)>>,
}

impl MockAdapter {
    /// A mock with no remote resource.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// A mock holding this remote representation.
    pub fn with_remote(value: Value) -> Self {
        Self {
            remote: Mutex::new(RemoteState::found(value)),
            ..Self::default()
        }
    }

    /// Script every subsequent call to fail with this remote error.
    pub fn fail_with(&self, status: u16, body: impl Into<String>) {
        *self.fail.lock().expect("mock poisoned") = Some((status, body.into()));
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.calls.lock().expect("mock poisoned").clone()
    }

    /// Recorded calls that would mutate remote state.
    pub fn mutations(&self) -> Vec<AdapterCall> {
        self.calls()
            .into_iter()
            .filter(AdapterCall::is_mutation)
            .collect()
    }

    /// The remote state the mock currently holds.
    pub fn remote(&self) -> RemoteState {
        self.remote.lock().expect("mock poisoned").clone()
    }

    fn record(&self, call: AdapterCall) -> Result<()> {
        self.calls.lock().expect("mock poisoned").push(call);
        if let Some((status, body)) = self.fail.lock().expect("mock poisoned").clone() {
            return Err(Error::Remote { status, body });
        }
        Ok(())
    }
}

impl ResourceAdapter for MockAdapter {
    fn find(&self, id: &str) -> Result<RemoteState> {
        self.record(AdapterCall::Find(id.to_string()))?;
        Ok(self.remote())
    }

    fn create(&self, payload: &Map<String, Value>) -> Result<Value> {
        self.record(AdapterCall::Create(payload.clone()))?;
        let state = RemoteState::Found(payload.clone());
        *self.remote.lock().expect("mock poisoned") = state.clone();
        Ok(state.to_value())
    }

    fn edit(&self, id: &str, payload: &Map<String, Value>) -> Result<Value> {
        self.record(AdapterCall::Edit(id.to_string(), payload.clone()))?;
        let mut guard = self.remote.lock().expect("mock poisoned");
        let mut map = match guard.clone() {
            RemoteState::Found(map) => map,
            RemoteState::NotFound => Map::new(),
        };
        for (name, value) in payload {
            map.insert(name.clone(), value.clone());
        }
        *guard = RemoteState::Found(map.clone());
        Ok(Value::Object(map))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.record(AdapterCall::Delete(id.to_string()))?;
        let mut guard = self.remote.lock().expect("mock poisoned");
        let existed = guard.is_found();
        *guard = RemoteState::NotFound;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_records_calls_in_order() {
        let mock = MockAdapter::not_found();
        let payload = Map::new();
        mock.find("a").unwrap();
        mock.create(&payload).unwrap();
        mock.delete("a").unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], AdapterCall::Find("a".to_string()));
        assert!(calls[1].is_mutation());
        assert_eq!(mock.mutations().len(), 2);
    }

    #[test]
    fn test_mock_create_then_find() {
        let mock = MockAdapter::not_found();
        let payload: Map<String, Value> = [("name".to_string(), json!("bug"))].into_iter().collect();
        mock.create(&payload).unwrap();
        assert_eq!(mock.find("bug").unwrap().get("name"), Some(&json!("bug")));
    }

    #[test]
    fn test_mock_edit_merges() {
        let mock = MockAdapter::with_remote(json!({"name": "bug", "color": "ff0000"}));
        let payload: Map<String, Value> =
            [("color".to_string(), json!("00ff00"))].into_iter().collect();
        let updated = mock.edit("bug", &payload).unwrap();
        assert_eq!(updated["name"], json!("bug"));
        assert_eq!(updated["color"], json!("00ff00"));
    }

    #[test]
    fn test_mock_delete_reports_prior_existence() {
        let mock = MockAdapter::with_remote(json!({"name": "bug"}));
        assert!(mock.delete("bug").unwrap());
        assert!(!mock.delete("bug").unwrap());
    }

    #[test]
    fn test_mock_scripted_failure() {
        let mock = MockAdapter::not_found();
        mock.fail_with(500, "boom");
        let err = mock.find("a").unwrap_err();
        assert!(matches!(err, Error::Remote { status: 500, .. }));
    }
}
