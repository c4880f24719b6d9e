//! Branches.
//!
//! A branch either exists or it does not, so `present` leaves an existing
//! branch untouched; creating one resolves the head SHA of the source
//! branch (the repository default when no source is given) and creates a
//! ref from it. The extra `default` transition makes the branch the
//! repository default.

use crate::client::GithubClient;
use reconcile::{
    Descriptor, Error, Outcome, PresencePolicy, RemoteState, ResourceAdapter, Result,
    StateModule, transition,
};
use serde_json::{Map, Value, json};

/// Desired configuration for one branch.
#[derive(Debug, Clone, Default)]
pub struct BranchSpec {
    /// Branch name (identity within the repository).
    pub name: String,
    /// Branch to create from; the repository default branch when omitted.
    pub source: Option<String>,
}

impl BranchSpec {
    /// Build and validate the descriptor. Fails before any network call.
    pub fn descriptor(&self) -> Result<Descriptor> {
        validate_branch_name("name", &self.name)?;
        if let Some(source) = &self.source {
            validate_branch_name("source", source)?;
        }

        Ok(Descriptor::builder(&self.name)
            .set("name", &self.name)
            .opt("source", self.source.as_deref())
            .build())
    }
}

fn validate_branch_name(field: &str, name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('-')
        || name.starts_with('/')
        || name.ends_with('/')
        || name.ends_with(".lock")
        || name.contains("..")
        || name.chars().any(|c| c.is_ascii_whitespace() || c == '~' || c == '^' || c == ':');
    if invalid {
        Err(Error::validation(
            field,
            format!("'{name}' is not a valid branch name"),
        ))
    } else {
        Ok(())
    }
}

/// Branch-specific operations beyond the generic adapter contract.
pub trait BranchOps: ResourceAdapter {
    /// Representation of the owning repository.
    fn repository(&self) -> Result<RemoteState>;

    /// Make the named branch the repository default; returns the updated
    /// repository representation.
    fn set_default(&self, name: &str) -> Result<Value>;
}

/// Adapter for the branch endpoints of one repository.
#[derive(Debug)]
pub struct BranchAdapter {
    client: GithubClient,
    owner: String,
    repo: String,
}

impl BranchAdapter {
    /// Bind the adapter to a repository.
    pub fn new(client: GithubClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn repo_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }

    fn branch_path(&self, name: &str) -> String {
        format!("{}/branches/{name}", self.repo_path())
    }

    fn ref_path(&self, name: &str) -> String {
        format!("{}/git/refs/heads/{name}", self.repo_path())
    }

    /// Head commit SHA of a branch.
    fn head_sha(&self, name: &str) -> Result<String> {
        let branch = self.client.get(&self.branch_path(name))?;
        branch
            .get("commit")
            .and_then(|commit| commit.get("sha"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| Error::Remote {
                status: 404,
                body: format!("branch '{name}' has no resolvable head commit"),
            })
    }

    /// The branch to fork from: explicit source, or the repository default.
    fn source_branch(&self, payload: &Map<String, Value>) -> Result<String> {
        if let Some(source) = payload.get("source").and_then(Value::as_str) {
            return Ok(source.to_string());
        }

        self.repository()?
            .get("default_branch")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| Error::Remote {
                status: 404,
                body: "repository has no default branch to fork from".to_string(),
            })
    }
}

impl ResourceAdapter for BranchAdapter {
    fn find(&self, id: &str) -> Result<RemoteState> {
        self.client.get(&self.branch_path(id))
    }

    fn create(&self, payload: &Map<String, Value>) -> Result<Value> {
        let name = payload
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("name", "missing from branch payload"))?;

        let source = self.source_branch(payload)?;
        let sha = self.head_sha(&source)?;

        self.client.post(
            &format!("{}/git/refs", self.repo_path()),
            &json!({"ref": format!("refs/heads/{name}"), "sha": sha}),
        )?;

        // Refetch for the branch representation; the refs API only
        // returns the bare ref object.
        Ok(self.find(name)?.to_value())
    }

    fn edit(&self, _id: &str, _payload: &Map<String, Value>) -> Result<Value> {
        // Branches carry no editable settings here; protection rules are
        // a separate API and out of scope.
        Err(Error::Unsupported {
            kind: "branch".to_string(),
            operation: "edit".to_string(),
        })
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.client.delete(&self.ref_path(id))
    }
}

impl BranchOps for BranchAdapter {
    fn repository(&self) -> Result<RemoteState> {
        self.client.get(&self.repo_path())
    }

    fn set_default(&self, name: &str) -> Result<Value> {
        self.client
            .patch(&self.repo_path(), &json!({"default_branch": name}))
    }
}

/// State module for branches.
pub struct BranchModule<A: BranchOps> {
    adapter: A,
    descriptor: Descriptor,
}

impl BranchModule<BranchAdapter> {
    /// Validate the spec and bind to a repository.
    pub fn new(
        client: GithubClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
        spec: &BranchSpec,
    ) -> Result<Self> {
        Ok(Self {
            adapter: BranchAdapter::new(client, owner, repo),
            descriptor: spec.descriptor()?,
        })
    }
}

impl<A: BranchOps> StateModule for BranchModule<A> {
    fn kind(&self) -> &'static str {
        "branch"
    }

    fn present(&self, check_mode: bool) -> Result<Outcome> {
        transition::present(
            &self.adapter,
            &self.descriptor,
            PresencePolicy::LeaveExisting,
            &[],
            check_mode,
        )
    }

    fn absent(&self, check_mode: bool) -> Result<Outcome> {
        transition::absent(&self.adapter, self.descriptor.identity(), check_mode)
    }

    fn transition(&self, state: &str, check_mode: bool) -> Result<Outcome> {
        match state {
            "default" => self.make_default(check_mode),
            other => Err(Error::unsupported_state(self.kind(), other)),
        }
    }
}

impl<A: BranchOps> BranchModule<A> {
    fn make_default(&self, check_mode: bool) -> Result<Outcome> {
        let name = self.descriptor.identity();
        let repository = self.adapter.repository()?;

        if repository.get("default_branch").and_then(Value::as_str) == Some(name) {
            return Ok(Outcome::unchanged(Some(repository.to_value())));
        }

        if check_mode {
            return Ok(Outcome::changed(Some(repository.to_value())));
        }

        let updated = self.adapter.set_default(name)?;
        Ok(Outcome::changed(Some(updated)))
    }
}
