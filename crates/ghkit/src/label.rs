//! Repository labels.
//!
//! `present` converges an existing label toward the descriptor, so a color
//! or description change on an existing label is applied in place.
//! `replace` is accepted as an explicit alias of the same convergence.

use crate::client::GithubClient;
use reconcile::{
    Descriptor, Error, Outcome, PresencePolicy, RemoteState, ResourceAdapter, Result,
    StateModule, transition,
};
use serde_json::{Map, Value};

/// `name` is the identity; renaming a label is not modeled, so the field
/// is legal only at creation.
const CREATE_ONLY: &[&str] = &["name"];

/// Desired configuration for one label.
#[derive(Debug, Clone, Default)]
pub struct LabelSpec {
    /// Label name (identity).
    pub name: String,
    /// Six-digit hex color, without the leading `#`.
    pub color: String,
    /// Optional short description.
    pub description: Option<String>,
    /// Fields to clear explicitly.
    pub clear: Vec<String>,
}

impl LabelSpec {
    /// Build and validate the descriptor. Fails before any network call.
    pub fn descriptor(&self) -> Result<Descriptor> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        validate_color(&self.color)?;

        Ok(Descriptor::builder(&self.name)
            .set("name", &self.name)
            .set("color", self.color.to_lowercase())
            .opt("description", self.description.as_deref())
            .clear_all(&self.clear)
            .build())
    }
}

fn validate_color(color: &str) -> Result<()> {
    if color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(Error::validation(
            "color",
            format!("'{color}' is not a 6-digit hex color (without the leading '#')"),
        ))
    }
}

/// Adapter for the labels endpoints of one repository.
#[derive(Debug)]
pub struct LabelAdapter {
    client: GithubClient,
    owner: String,
    repo: String,
}

impl LabelAdapter {
    /// Bind the adapter to a repository.
    pub fn new(client: GithubClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn collection_path(&self) -> String {
        format!("/repos/{}/{}/labels", self.owner, self.repo)
    }

    fn item_path(&self, name: &str) -> String {
        format!("{}/{name}", self.collection_path())
    }
}

impl ResourceAdapter for LabelAdapter {
    fn find(&self, id: &str) -> Result<RemoteState> {
        self.client.get(&self.item_path(id))
    }

    fn create(&self, payload: &Map<String, Value>) -> Result<Value> {
        self.client
            .post(&self.collection_path(), &Value::Object(payload.clone()))
    }

    fn edit(&self, id: &str, payload: &Map<String, Value>) -> Result<Value> {
        self.client
            .patch(&self.item_path(id), &Value::Object(payload.clone()))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.client.delete(&self.item_path(id))
    }
}

/// State module for labels.
pub struct LabelModule<A: ResourceAdapter> {
    adapter: A,
    descriptor: Descriptor,
}

impl LabelModule<LabelAdapter> {
    /// Validate the spec and bind to a repository.
    pub fn new(
        client: GithubClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
        spec: &LabelSpec,
    ) -> Result<Self> {
        Ok(Self {
            adapter: LabelAdapter::new(client, owner, repo),
            descriptor: spec.descriptor()?,
        })
    }
}

impl<A: ResourceAdapter> StateModule for LabelModule<A> {
    fn kind(&self) -> &'static str {
        "label"
    }

    fn present(&self, check_mode: bool) -> Result<Outcome> {
        transition::present(
            &self.adapter,
            &self.descriptor,
            PresencePolicy::Converge,
            CREATE_ONLY,
            check_mode,
        )
    }

    fn absent(&self, check_mode: bool) -> Result<Outcome> {
        transition::absent(&self.adapter, self.descriptor.identity(), check_mode)
    }

    fn transition(&self, state: &str, check_mode: bool) -> Result<Outcome> {
        match state {
            "replace" => {
                transition::replace(&self.adapter, &self.descriptor, CREATE_ONLY, check_mode)
            }
            other => Err(Error::unsupported_state(self.kind(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{AdapterCall, MockAdapter};
    use serde_json::json;

    fn spec(color: &str) -> LabelSpec {
        LabelSpec {
            name: "bug".to_string(),
            color: color.to_string(),
            ..LabelSpec::default()
        }
    }

    fn module(adapter: MockAdapter, color: &str) -> LabelModule<MockAdapter> {
        LabelModule {
            adapter,
            descriptor: spec(color).descriptor().unwrap(),
        }
    }

    #[test]
    fn test_endpoint_paths() {
        let client = GithubClient::new("t0ken", crate::client::DEFAULT_API_URL);
        let adapter = LabelAdapter::new(client, "me", "project");
        assert_eq!(adapter.collection_path(), "/repos/me/project/labels");
        assert_eq!(adapter.item_path("bug"), "/repos/me/project/labels/bug");
    }

    #[test]
    fn test_invalid_color_fails_before_any_adapter_call() {
        let err = spec("zzzzzz").descriptor().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "color"));

        let err = spec("ff00").descriptor().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_color_is_lowercased() {
        let desc = spec("FF0000").descriptor().unwrap();
        assert_eq!(desc.payload().get("color"), Some(&json!("ff0000")));
    }

    #[test]
    fn test_present_creates_missing_label() {
        let module = module(MockAdapter::not_found(), "ff0000");
        let outcome = module.apply("present", false).unwrap();

        assert!(outcome.changed);
        let AdapterCall::Create(payload) = &module.adapter.calls()[1] else {
            panic!("expected a create call");
        };
        assert_eq!(payload.get("name"), Some(&json!("bug")));
        assert_eq!(payload.get("color"), Some(&json!("ff0000")));
        assert!(!payload.contains_key("description"));
    }

    #[test]
    fn test_present_converges_existing_label() {
        let module = module(
            MockAdapter::with_remote(json!({"name": "bug", "color": "ff0000"})),
            "00ff00",
        );
        let outcome = module.apply("present", false).unwrap();

        assert!(outcome.changed);
        let AdapterCall::Edit(id, payload) = &module.adapter.calls()[1] else {
            panic!("expected an edit call");
        };
        assert_eq!(id, "bug");
        assert_eq!(payload.get("color"), Some(&json!("00ff00")));
        assert!(!payload.contains_key("name"));
    }

    #[test]
    fn test_replace_matching_label_is_unchanged() {
        let module = module(
            MockAdapter::with_remote(json!({"name": "bug", "color": "ff0000"})),
            "ff0000",
        );
        let outcome = module.apply("replace", false).unwrap();

        assert!(!outcome.changed);
        assert!(module.adapter.mutations().is_empty());
    }

    #[test]
    fn test_absent_check_mode_leaves_label_alone() {
        let module = module(MockAdapter::with_remote(json!({"name": "bug"})), "ff0000");
        let outcome = module.apply("absent", true).unwrap();

        assert!(outcome.changed);
        assert!(module.adapter.mutations().is_empty());
    }

    #[test]
    fn test_unknown_state_is_unsupported() {
        let module = module(MockAdapter::not_found(), "ff0000");
        let err = module.apply("archived", false).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }
}
