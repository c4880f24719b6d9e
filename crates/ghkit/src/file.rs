//! Repository files (contents API).
//!
//! Content equality is byte-exact: the desired side is the UTF-8 bytes of
//! inline `content` or the raw bytes of a local `src` file, the remote
//! side is the base64-decoded `content` field of the contents API
//! response. Updates and deletes carry the blob SHA the API requires.

use crate::client::GithubClient;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reconcile::{
    Error, Outcome, RemoteState, ResourceAdapter, Result, StateModule,
};
use serde_json::{Map, Value, json};
use std::path::PathBuf;

/// Desired configuration for one file.
#[derive(Debug, Clone, Default)]
pub struct FileSpec {
    /// Path of the file within the repository (identity).
    pub path: String,
    /// Inline desired content. Mutually exclusive with `src`.
    pub content: Option<String>,
    /// Local file to read the desired content from. Mutually exclusive
    /// with `content`.
    pub src: Option<PathBuf>,
    /// Branch to read and write; the repository default when omitted.
    pub branch: Option<String>,
    /// Commit message for create/update/delete commits.
    pub message: Option<String>,
}

impl FileSpec {
    /// Validate the spec and resolve the desired bytes.
    ///
    /// The mutual exclusion of `content` and `src` and the readability of
    /// `src` are checked here, before any network call. Neither is
    /// required: `absent` needs no desired content at all, and `present`
    /// checks for it before touching the adapter.
    pub fn desired_bytes(&self) -> Result<Option<Vec<u8>>> {
        validate_path(&self.path)?;

        match (&self.content, &self.src) {
            (Some(_), Some(_)) => Err(Error::validation(
                "content",
                "mutually exclusive with 'src'",
            )),
            (Some(content), None) => Ok(Some(content.clone().into_bytes())),
            (None, Some(src)) => std::fs::read(src).map(Some).map_err(|err| {
                Error::validation("src", format!("cannot read '{}': {err}", src.display()))
            }),
            (None, None) => Ok(None),
        }
    }
}

fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() || path.starts_with('/') || path.split('/').any(|part| part == "..") {
        Err(Error::validation(
            "path",
            format!("'{path}' must be a relative path without '..' components"),
        ))
    } else {
        Ok(())
    }
}

/// Decode the remote content for comparison.
///
/// Anything the contents API cannot hand back as base64 bytes (a
/// directory, a submodule, an over-limit blob) cannot be compared without
/// mutating, so it surfaces as an unsupported operation.
fn remote_bytes(path: &str, remote: &RemoteState) -> Result<Vec<u8>> {
    let unsupported = |reason: &str| Error::Unsupported {
        kind: "file".to_string(),
        operation: format!("content comparison for '{path}': {reason}"),
    };

    if remote.get("type").and_then(Value::as_str) != Some("file") {
        return Err(unsupported("not a regular file"));
    }

    match remote.get("encoding").and_then(Value::as_str) {
        Some("base64") | None => {}
        Some(other) => return Err(unsupported(&format!("unexpected encoding '{other}'"))),
    }

    let encoded: String = remote
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| unsupported("no content returned"))?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    BASE64
        .decode(encoded)
        .map_err(|_| unsupported("content is not valid base64"))
}

/// Adapter for the contents endpoints of one repository.
///
/// `delete` must supply the current blob SHA, so it performs one extra
/// read to resolve it; this is the only adapter call here that is not a
/// single request.
#[derive(Debug)]
pub struct FileAdapter {
    client: GithubClient,
    owner: String,
    repo: String,
    branch: Option<String>,
    message: Option<String>,
}

impl FileAdapter {
    /// Bind the adapter to a repository (and optionally a branch).
    pub fn new(
        client: GithubClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: Option<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
            branch,
            message,
        }
    }

    fn contents_path(&self, path: &str) -> String {
        format!("/repos/{}/{}/contents/{path}", self.owner, self.repo)
    }

    fn write_body(&self, payload: &Map<String, Value>) -> Value {
        let mut body = payload.clone();
        body.remove("path");
        if let Some(branch) = &self.branch {
            body.insert("branch".to_string(), json!(branch));
        }
        Value::Object(body)
    }

    /// The "content" half of a contents API write response.
    fn content_part(response: Value) -> Value {
        match response {
            Value::Object(mut map) => map.remove("content").unwrap_or(Value::Null),
            other => other,
        }
    }
}

impl ResourceAdapter for FileAdapter {
    fn find(&self, id: &str) -> Result<RemoteState> {
        let mut path = self.contents_path(id);
        if let Some(branch) = &self.branch {
            path.push_str(&format!("?ref={branch}"));
        }
        self.client.get(&path)
    }

    fn create(&self, payload: &Map<String, Value>) -> Result<Value> {
        let id = payload
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("path", "missing from file payload"))?;
        let response = self
            .client
            .put(&self.contents_path(id), &self.write_body(payload))?;
        Ok(Self::content_part(response))
    }

    fn edit(&self, id: &str, payload: &Map<String, Value>) -> Result<Value> {
        let response = self
            .client
            .put(&self.contents_path(id), &self.write_body(payload))?;
        Ok(Self::content_part(response))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        // The delete endpoint requires the current blob SHA.
        let remote = self.find(id)?;
        let Some(sha) = remote.get("sha").and_then(Value::as_str) else {
            return Ok(false);
        };

        let message = self
            .message
            .clone()
            .unwrap_or_else(|| format!("delete {id}"));
        let mut body = json!({"message": message, "sha": sha});
        if let Some(branch) = &self.branch {
            body["branch"] = json!(branch);
        }

        self.client.delete_with_body(&self.contents_path(id), &body)
    }
}

/// State module for files.
pub struct FileModule<A: ResourceAdapter> {
    adapter: A,
    path: String,
    desired: Option<Vec<u8>>,
    message: Option<String>,
}

impl FileModule<FileAdapter> {
    /// Validate the spec and bind to a repository.
    pub fn new(
        client: GithubClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
        spec: &FileSpec,
    ) -> Result<Self> {
        let desired = spec.desired_bytes()?;
        Ok(Self {
            adapter: FileAdapter::new(
                client,
                owner,
                repo,
                spec.branch.clone(),
                spec.message.clone(),
            ),
            path: spec.path.clone(),
            desired,
            message: spec.message.clone(),
        })
    }
}

impl<A: ResourceAdapter> FileModule<A> {
    fn write_payload(&self, desired: &[u8], verb: &str, sha: Option<&str>) -> Map<String, Value> {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| format!("{verb} {}", self.path));

        let mut payload = Map::new();
        payload.insert("path".to_string(), json!(self.path));
        payload.insert("message".to_string(), json!(message));
        payload.insert("content".to_string(), json!(BASE64.encode(desired)));
        if let Some(sha) = sha {
            payload.insert("sha".to_string(), json!(sha));
        }
        payload
    }
}

impl<A: ResourceAdapter> StateModule for FileModule<A> {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn present(&self, check_mode: bool) -> Result<Outcome> {
        let desired = self.desired.as_deref().ok_or_else(|| {
            Error::validation("content", "one of 'content' or 'src' is required")
        })?;

        let remote = self.adapter.find(&self.path)?;

        let RemoteState::Found(_) = remote else {
            if check_mode {
                let payload = self.write_payload(desired, "create", None);
                return Ok(Outcome::changed(Some(Value::Object(payload))));
            }
            let payload = self.write_payload(desired, "create", None);
            let created = self.adapter.create(&payload)?;
            return Ok(Outcome::changed(Some(created)));
        };

        if remote_bytes(&self.path, &remote)? == desired {
            return Ok(Outcome::unchanged(Some(remote.to_value())));
        }

        if check_mode {
            return Ok(Outcome::changed(Some(remote.to_value())));
        }

        let sha = remote
            .get("sha")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Remote {
                status: 422,
                body: format!("no blob SHA returned for '{}'", self.path),
            })?;
        let payload = self.write_payload(desired, "update", Some(sha));
        let updated = self.adapter.edit(&self.path, &payload)?;
        Ok(Outcome::changed(Some(updated)))
    }

    fn absent(&self, check_mode: bool) -> Result<Outcome> {
        reconcile::transition::absent(&self.adapter, &self.path, check_mode)
    }
}
