//! Thin blocking client for the GitHub REST API.
//!
//! One [`GithubClient`] wraps a `ureq` agent with the fixed GitHub
//! headers (JSON accept, bearer token, API version) and maps responses
//! into the reconciliation vocabulary: 404 becomes
//! [`RemoteState::NotFound`] on reads and `false` on deletes, any other
//! non-success status becomes [`reconcile::Error::Remote`] carrying the
//! status and raw body.
//!
//! The endpoint is an explicit constructor argument; there is no
//! process-wide default beyond the [`DEFAULT_API_URL`] constant callers
//! may pass.

use reconcile::{Error, RemoteState, Result};
use serde_json::Value;
use ureq::Agent;

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Pinned REST API version, sent on every request.
pub const API_VERSION: &str = "2022-11-28";

const USER_AGENT: &str = concat!("octoset/", env!("CARGO_PKG_VERSION"));

/// Bearer-token client for one GitHub endpoint.
#[derive(Debug, Clone)]
pub struct GithubClient {
    agent: Agent,
    base_url: String,
    token: String,
}

impl GithubClient {
    /// Create a client for the given endpoint.
    ///
    /// Non-2xx statuses are delivered as responses rather than transport
    /// errors so the error body survives into [`Error::Remote`].
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();

        let base_url = base_url.into();
        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// The endpoint this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn decorate<B>(&self, builder: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        builder
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
    }

    /// Fetch a resource. 404 is a normal "not found" observation.
    pub fn get(&self, path: &str) -> Result<RemoteState> {
        log::debug!("GET {path}");
        let response = self
            .decorate(self.agent.get(self.url(path)))
            .call()
            .map_err(transport)?;
        let (status, body) = read_body(response)?;

        match status {
            s if is_success(s) => Ok(RemoteState::found(parse_json(&body))),
            404 => Ok(RemoteState::NotFound),
            s => Err(remote(s, body)),
        }
    }

    /// Create a resource.
    pub fn post(&self, path: &str, body: &Value) -> Result<Value> {
        log::debug!("POST {path}");
        let response = self
            .decorate(self.agent.post(self.url(path)))
            .send_json(body)
            .map_err(transport)?;
        expect_success(response)
    }

    /// Edit a resource.
    pub fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        log::debug!("PATCH {path}");
        let response = self
            .decorate(self.agent.patch(self.url(path)))
            .send_json(body)
            .map_err(transport)?;
        expect_success(response)
    }

    /// Create or replace a resource.
    pub fn put(&self, path: &str, body: &Value) -> Result<Value> {
        log::debug!("PUT {path}");
        let response = self
            .decorate(self.agent.put(self.url(path)))
            .send_json(body)
            .map_err(transport)?;
        expect_success(response)
    }

    /// Delete a resource. Returns `false` when it was already gone.
    pub fn delete(&self, path: &str) -> Result<bool> {
        log::debug!("DELETE {path}");
        let response = self
            .decorate(self.agent.delete(self.url(path)))
            .call()
            .map_err(transport)?;
        expect_deleted(response)
    }

    /// Delete with a JSON body (the contents API wants commit details).
    pub fn delete_with_body(&self, path: &str, body: &Value) -> Result<bool> {
        log::debug!("DELETE {path}");
        let response = self
            .decorate(self.agent.delete(self.url(path)))
            .force_send_body()
            .send_json(body)
            .map_err(transport)?;
        expect_deleted(response)
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn transport(err: ureq::Error) -> Error {
    Error::Transport(err.to_string())
}

fn remote(status: u16, body: String) -> Error {
    Error::Remote { status, body }
}

fn read_body(mut response: ureq::http::Response<ureq::Body>) -> Result<(u16, String)> {
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(transport)?;
    Ok((status, body))
}

fn parse_json(body: &str) -> Value {
    if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
    }
}

fn expect_success(response: ureq::http::Response<ureq::Body>) -> Result<Value> {
    let (status, body) = read_body(response)?;
    if is_success(status) {
        Ok(parse_json(&body))
    } else {
        Err(remote(status, body))
    }
}

fn expect_deleted(response: ureq::http::Response<ureq::Body>) -> Result<bool> {
    let (status, body) = read_body(response)?;
    match status {
        s if is_success(s) => Ok(true),
        404 => Ok(false),
        s => Err(remote(s, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = GithubClient::new("t0ken", "https://ghe.example.com/api/v3/");
        assert_eq!(client.base_url(), "https://ghe.example.com/api/v3");
        assert_eq!(
            client.url("/repos/me/project"),
            "https://ghe.example.com/api/v3/repos/me/project"
        );
    }

    #[test]
    fn test_default_endpoint_constant() {
        let client = GithubClient::new("t0ken", DEFAULT_API_URL);
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[test]
    fn test_parse_json_variants() {
        assert_eq!(parse_json(""), Value::Null);
        assert_eq!(parse_json("  "), Value::Null);
        assert_eq!(parse_json("{\"a\":1}"), serde_json::json!({"a": 1}));
        // Non-JSON bodies are kept verbatim for error reporting.
        assert_eq!(parse_json("oops"), Value::String("oops".to_string()));
    }

    #[test]
    fn test_success_range() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(301));
        assert!(!is_success(404));
        assert!(!is_success(500));
    }
}
