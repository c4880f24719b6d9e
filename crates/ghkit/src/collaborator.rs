//! Repository collaborators.
//!
//! The invitation endpoint accepts `pull`/`triage`/`push`/`maintain`/
//! `admin`, while the permission endpoint reports `read`/`write` for the
//! first two of those. Permissions are normalized to the invitation
//! vocabulary before comparison so "push" against a reported "write" is
//! not a spurious diff.

use crate::client::GithubClient;
use reconcile::{
    Descriptor, Error, Outcome, PresencePolicy, RemoteState, ResourceAdapter, Result,
    StateModule, transition,
};
use serde_json::{Map, Value, json};

/// Permission levels accepted by the invitation endpoint.
pub const PERMISSIONS: &[&str] = &["pull", "triage", "push", "maintain", "admin"];

/// Map reported permission names onto the invitation vocabulary.
fn normalize_permission(permission: &str) -> String {
    match permission {
        "write" => "push".to_string(),
        "read" => "pull".to_string(),
        other => other.to_string(),
    }
}

/// Desired configuration for one collaborator.
#[derive(Debug, Clone)]
pub struct CollaboratorSpec {
    /// Login of the collaborator (identity).
    pub username: String,
    /// Permission level, one of [`PERMISSIONS`] or the reported
    /// aliases `read`/`write`.
    pub permission: String,
}

impl CollaboratorSpec {
    /// Build and validate the descriptor. Fails before any network call.
    pub fn descriptor(&self) -> Result<Descriptor> {
        if self.username.trim().is_empty() {
            return Err(Error::validation("username", "must not be empty"));
        }
        // Aliases fold into the invitation vocabulary before validation,
        // so "write" and "read" are accepted on input too.
        let permission = normalize_permission(&self.permission);
        if !PERMISSIONS.contains(&permission.as_str()) {
            return Err(Error::validation(
                "permission",
                format!(
                    "'{}' is not one of {} (or the aliases read, write)",
                    self.permission,
                    PERMISSIONS.join(", ")
                ),
            ));
        }

        Ok(Descriptor::builder(&self.username)
            .set("username", &self.username)
            .set("permission", permission)
            .build())
    }
}

/// Adapter for the collaborator endpoints of one repository.
#[derive(Debug)]
pub struct CollaboratorAdapter {
    client: GithubClient,
    owner: String,
    repo: String,
}

impl CollaboratorAdapter {
    /// Bind the adapter to a repository.
    pub fn new(client: GithubClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn item_path(&self, username: &str) -> String {
        format!("/repos/{}/{}/collaborators/{username}", self.owner, self.repo)
    }

    fn permission_path(&self, username: &str) -> String {
        format!("{}/permission", self.item_path(username))
    }

    fn put_permission(&self, username: &str, payload: &Map<String, Value>) -> Result<Value> {
        let permission = payload
            .get("permission")
            .cloned()
            .unwrap_or_else(|| json!("push"));
        let body = json!({"permission": permission});
        let response = self.client.put(&self.item_path(username), &body)?;

        // 204 returns no body when the user is added directly; answer with
        // the state we just asked for.
        if response.is_null() {
            Ok(json!({"username": username, "permission": permission}))
        } else {
            Ok(response)
        }
    }
}

impl ResourceAdapter for CollaboratorAdapter {
    fn find(&self, id: &str) -> Result<RemoteState> {
        let remote = self.client.get(&self.permission_path(id))?;

        let permission = remote
            .get("permission")
            .and_then(Value::as_str)
            .map(normalize_permission);

        // The permission endpoint answers for any existing user; "none"
        // means the user is not a collaborator of this repository.
        match permission.as_deref() {
            None | Some("none") => Ok(RemoteState::NotFound),
            Some(permission) => Ok(RemoteState::found(
                json!({"username": id, "permission": permission}),
            )),
        }
    }

    fn create(&self, payload: &Map<String, Value>) -> Result<Value> {
        let username = payload
            .get("username")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("username", "missing from collaborator payload"))?;
        self.put_permission(username, payload)
    }

    fn edit(&self, id: &str, payload: &Map<String, Value>) -> Result<Value> {
        self.put_permission(id, payload)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.client.delete(&self.item_path(id))
    }
}

/// State module for collaborators.
pub struct CollaboratorModule<A: ResourceAdapter> {
    adapter: A,
    descriptor: Descriptor,
}

impl CollaboratorModule<CollaboratorAdapter> {
    /// Validate the spec and bind to a repository.
    pub fn new(
        client: GithubClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
        spec: &CollaboratorSpec,
    ) -> Result<Self> {
        Ok(Self {
            adapter: CollaboratorAdapter::new(client, owner, repo),
            descriptor: spec.descriptor()?,
        })
    }
}

impl<A: ResourceAdapter> StateModule for CollaboratorModule<A> {
    fn kind(&self) -> &'static str {
        "collaborator"
    }

    fn present(&self, check_mode: bool) -> Result<Outcome> {
        transition::present(
            &self.adapter,
            &self.descriptor,
            PresencePolicy::Converge,
            &[],
            check_mode,
        )
    }

    fn absent(&self, check_mode: bool) -> Result<Outcome> {
        transition::absent(&self.adapter, self.descriptor.identity(), check_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{AdapterCall, MockAdapter};
    use serde_json::json;

    fn spec(permission: &str) -> CollaboratorSpec {
        CollaboratorSpec {
            username: "octocat".to_string(),
            permission: permission.to_string(),
        }
    }

    fn module(adapter: MockAdapter, permission: &str) -> CollaboratorModule<MockAdapter> {
        CollaboratorModule {
            adapter,
            descriptor: spec(permission).descriptor().unwrap(),
        }
    }

    #[test]
    fn test_endpoint_paths() {
        let client = GithubClient::new("t0ken", crate::client::DEFAULT_API_URL);
        let adapter = CollaboratorAdapter::new(client, "me", "project");
        assert_eq!(
            adapter.item_path("octocat"),
            "/repos/me/project/collaborators/octocat"
        );
        assert_eq!(
            adapter.permission_path("octocat"),
            "/repos/me/project/collaborators/octocat/permission"
        );
    }

    #[test]
    fn test_permission_validation() {
        assert!(spec("push").descriptor().is_ok());
        assert!(spec("maintain").descriptor().is_ok());
        let err = spec("owner").descriptor().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "permission"));
    }

    #[test]
    fn test_alias_permissions_accepted_and_normalized() {
        let desc = spec("write").descriptor().unwrap();
        assert_eq!(desc.payload().get("permission"), Some(&json!("push")));

        let desc = spec("read").descriptor().unwrap();
        assert_eq!(desc.payload().get("permission"), Some(&json!("pull")));
    }

    #[test]
    fn test_normalization_folds_reported_names() {
        assert_eq!(normalize_permission("write"), "push");
        assert_eq!(normalize_permission("read"), "pull");
        assert_eq!(normalize_permission("admin"), "admin");
    }

    #[test]
    fn test_matching_permission_is_unchanged() {
        // Remote state as `find` reports it, already normalized.
        let module = module(
            MockAdapter::with_remote(json!({"username": "octocat", "permission": "push"})),
            "push",
        );
        let outcome = module.apply("present", false).unwrap();

        assert!(!outcome.changed);
        assert!(module.adapter.mutations().is_empty());
    }

    #[test]
    fn test_differing_permission_is_edited() {
        let module = module(
            MockAdapter::with_remote(json!({"username": "octocat", "permission": "pull"})),
            "admin",
        );
        let outcome = module.apply("present", false).unwrap();

        assert!(outcome.changed);
        let AdapterCall::Edit(id, payload) = &module.adapter.calls()[1] else {
            panic!("expected an edit call");
        };
        assert_eq!(id, "octocat");
        assert_eq!(payload.get("permission"), Some(&json!("admin")));
    }

    #[test]
    fn test_missing_collaborator_is_invited() {
        let module = module(MockAdapter::not_found(), "push");
        let outcome = module.apply("present", false).unwrap();

        assert!(outcome.changed);
        let AdapterCall::Create(payload) = &module.adapter.calls()[1] else {
            panic!("expected a create call");
        };
        assert_eq!(payload.get("username"), Some(&json!("octocat")));
    }
}
