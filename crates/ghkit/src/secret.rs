//! Actions secrets.
//!
//! Secret values are write-only: the API returns metadata but never the
//! value, so `present` cannot compare and always reports a change. For
//! the same reason check mode cannot preview `present` and is rejected
//! before any adapter call. `absent` is observable via the metadata
//! endpoint and supports check mode normally.
//!
//! Values are encrypted client-side with a libsodium sealed box against
//! the repository public key, as the API requires.

use crate::client::GithubClient;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use crypto_box::PublicKey;
use crypto_box::aead::OsRng;
use reconcile::{
    Descriptor, Error, Outcome, RemoteState, ResourceAdapter, Result, StateModule, transition,
};
use serde_json::{Map, Value, json};

/// Desired configuration for one actions secret.
#[derive(Debug, Clone, Default)]
pub struct SecretSpec {
    /// Secret name (identity).
    pub name: String,
    /// Plaintext value; required for `present`, ignored for `absent`.
    pub value: Option<String>,
}

impl SecretSpec {
    /// Build and validate the descriptor. Fails before any network call.
    pub fn descriptor(&self) -> Result<Descriptor> {
        validate_name(&self.name)?;

        Ok(Descriptor::builder(&self.name)
            .set("name", &self.name)
            .opt("value", self.value.as_deref())
            .build())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::validation(
            "name",
            format!("'{name}' must start with a letter or '_' and contain only letters, digits and '_'"),
        ));
    }
    if name.to_ascii_uppercase().starts_with("GITHUB_") {
        return Err(Error::validation(
            "name",
            "the 'GITHUB_' prefix is reserved",
        ));
    }
    Ok(())
}

/// Encrypt a secret value against a repository public key (base64,
/// X25519) using a libsodium sealed box.
fn seal_value(public_key_b64: &str, value: &str) -> Result<String> {
    let invalid_key = |message: &str| Error::Remote {
        status: 422,
        body: format!("repository public key: {message}"),
    };

    let raw = BASE64
        .decode(public_key_b64)
        .map_err(|_| invalid_key("not valid base64"))?;
    let raw: [u8; 32] = raw
        .try_into()
        .map_err(|_| invalid_key("not a 32-byte X25519 key"))?;

    let sealed = PublicKey::from(raw)
        .seal(&mut OsRng, value.as_bytes())
        .map_err(|_| invalid_key("sealed-box encryption failed"))?;
    Ok(BASE64.encode(sealed))
}

/// Adapter for the actions-secrets endpoints of one repository.
#[derive(Debug)]
pub struct SecretAdapter {
    client: GithubClient,
    owner: String,
    repo: String,
}

impl SecretAdapter {
    /// Bind the adapter to a repository.
    pub fn new(client: GithubClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn collection_path(&self) -> String {
        format!("/repos/{}/{}/actions/secrets", self.owner, self.repo)
    }

    fn item_path(&self, name: &str) -> String {
        format!("{}/{name}", self.collection_path())
    }

    fn public_key_path(&self) -> String {
        format!("{}/public-key", self.collection_path())
    }

    fn put_sealed(&self, payload: &Map<String, Value>) -> Result<Value> {
        let name = payload
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("name", "missing from secret payload"))?;
        let value = payload
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("value", "missing from secret payload"))?;

        let key = self.client.get(&self.public_key_path())?;
        let (key_id, key_b64) = match (
            key.get("key_id").and_then(Value::as_str),
            key.get("key").and_then(Value::as_str),
        ) {
            (Some(key_id), Some(key_b64)) => (key_id.to_string(), key_b64.to_string()),
            _ => {
                return Err(Error::Remote {
                    status: 404,
                    body: "repository public key unavailable".to_string(),
                });
            }
        };

        let encrypted_value = seal_value(&key_b64, value)?;
        self.client.put(
            &self.item_path(name),
            &json!({"encrypted_value": encrypted_value, "key_id": key_id}),
        )?;

        // Never echo the value back; metadata is all the API exposes.
        Ok(json!({"name": name}))
    }
}

impl ResourceAdapter for SecretAdapter {
    fn find(&self, id: &str) -> Result<RemoteState> {
        self.client.get(&self.item_path(id))
    }

    fn create(&self, payload: &Map<String, Value>) -> Result<Value> {
        self.put_sealed(payload)
    }

    fn edit(&self, _id: &str, payload: &Map<String, Value>) -> Result<Value> {
        self.put_sealed(payload)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.client.delete(&self.item_path(id))
    }
}

/// State module for actions secrets.
pub struct SecretModule<A: ResourceAdapter> {
    adapter: A,
    descriptor: Descriptor,
}

impl SecretModule<SecretAdapter> {
    /// Validate the spec and bind to a repository.
    pub fn new(
        client: GithubClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
        spec: &SecretSpec,
    ) -> Result<Self> {
        Ok(Self {
            adapter: SecretAdapter::new(client, owner, repo),
            descriptor: spec.descriptor()?,
        })
    }
}

impl<A: ResourceAdapter> StateModule for SecretModule<A> {
    fn kind(&self) -> &'static str {
        "secret"
    }

    fn present(&self, check_mode: bool) -> Result<Outcome> {
        // The stored value cannot be read back, so there is no way to
        // tell whether an apply would change anything.
        if check_mode {
            return Err(Error::unsupported_check_mode(self.kind(), "present"));
        }

        if !matches!(self.descriptor.get("value"), reconcile::FieldValue::Present(_)) {
            return Err(Error::validation("value", "required for state 'present'"));
        }

        let stored = self.adapter.create(&self.descriptor.payload())?;
        Ok(Outcome::changed(Some(stored)))
    }

    fn absent(&self, check_mode: bool) -> Result<Outcome> {
        transition::absent(&self.adapter, self.descriptor.identity(), check_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{AdapterCall, MockAdapter};

    fn module(adapter: MockAdapter, value: Option<&str>) -> SecretModule<MockAdapter> {
        SecretModule {
            adapter,
            descriptor: SecretSpec {
                name: "DEPLOY_KEY".to_string(),
                value: value.map(ToString::to_string),
            }
            .descriptor()
            .unwrap(),
        }
    }

    #[test]
    fn test_endpoint_paths() {
        let client = GithubClient::new("t0ken", crate::client::DEFAULT_API_URL);
        let adapter = SecretAdapter::new(client, "me", "project");
        assert_eq!(
            adapter.item_path("DEPLOY_KEY"),
            "/repos/me/project/actions/secrets/DEPLOY_KEY"
        );
        assert_eq!(
            adapter.public_key_path(),
            "/repos/me/project/actions/secrets/public-key"
        );
    }

    #[test]
    fn test_name_validation() {
        for name in ["DEPLOY_KEY", "_hidden", "k8s_TOKEN"] {
            assert!(validate_name(name).is_ok(), "{name}");
        }
        for name in ["", "1BAD", "BAD-NAME", "GITHUB_TOKEN"] {
            assert!(validate_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn test_seal_roundtrip() {
        let secret_key = crypto_box::SecretKey::generate(&mut OsRng);
        let public_b64 = BASE64.encode(secret_key.public_key().as_bytes());

        let sealed = seal_value(&public_b64, "s3cret").unwrap();
        let opened = secret_key.unseal(&BASE64.decode(sealed).unwrap()).unwrap();
        assert_eq!(opened, b"s3cret");
    }

    #[test]
    fn test_seal_rejects_bad_keys() {
        assert!(seal_value("!!!", "x").is_err());
        assert!(seal_value(&BASE64.encode([0u8; 7]), "x").is_err());
    }

    #[test]
    fn test_present_always_reports_changed() {
        let module = module(MockAdapter::not_found(), Some("hunter2"));
        let outcome = module.present(false).unwrap();

        assert!(outcome.changed);
        assert!(matches!(module.adapter.calls()[0], AdapterCall::Create(_)));
    }

    #[test]
    fn test_present_check_mode_is_rejected_before_any_call() {
        let module = module(MockAdapter::not_found(), Some("hunter2"));
        let err = module.present(true).unwrap_err();

        assert!(matches!(err, Error::Unsupported { .. }));
        assert!(module.adapter.calls().is_empty());
    }

    #[test]
    fn test_present_without_value_is_a_validation_error() {
        let module = module(MockAdapter::not_found(), None);
        let err = module.present(false).unwrap_err();

        assert!(matches!(err, Error::Validation { ref field, .. } if field == "value"));
        assert!(module.adapter.calls().is_empty());
    }

    #[test]
    fn test_absent_supports_check_mode() {
        let module = module(
            MockAdapter::with_remote(serde_json::json!({"name": "DEPLOY_KEY"})),
            None,
        );
        let outcome = module.absent(true).unwrap();

        assert!(outcome.changed);
        assert!(module.adapter.mutations().is_empty());
    }
}
