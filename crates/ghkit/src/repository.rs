//! Repositories.
//!
//! `present` converges an existing repository toward the descriptor.
//! The extra `archived` transition flips the single flag the API exposes
//! for archiving, without touching any other setting.

use crate::client::GithubClient;
use reconcile::{
    Descriptor, Error, Outcome, PresencePolicy, RemoteState, ResourceAdapter, Result,
    StateModule, transition,
};
use serde_json::{Map, Value, json};

/// Fields the create endpoint accepts but the edit endpoint does not.
const CREATE_ONLY: &[&str] = &["auto_init", "gitignore_template", "license_template"];

/// Desired configuration for one repository.
#[derive(Debug, Clone, Default)]
pub struct RepositorySpec {
    /// Repository name (identity within the owner).
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Homepage URL.
    pub homepage: Option<String>,
    /// Private visibility.
    pub private: Option<bool>,
    /// Enable the issues feature.
    pub has_issues: Option<bool>,
    /// Enable the wiki feature.
    pub has_wiki: Option<bool>,
    /// Enable the projects feature.
    pub has_projects: Option<bool>,
    /// Enable downloads.
    pub has_downloads: Option<bool>,
    /// Allow merge commits on pull requests.
    pub allow_merge_commit: Option<bool>,
    /// Allow squash merging.
    pub allow_squash_merge: Option<bool>,
    /// Allow rebase merging.
    pub allow_rebase_merge: Option<bool>,
    /// Delete head branches after merge.
    pub delete_branch_on_merge: Option<bool>,
    /// Create an initial commit (create-only).
    pub auto_init: Option<bool>,
    /// Gitignore template name (create-only).
    pub gitignore_template: Option<String>,
    /// License template keyword (create-only).
    pub license_template: Option<String>,
    /// Fields to clear explicitly.
    pub clear: Vec<String>,
}

impl RepositorySpec {
    /// Build and validate the descriptor. Fails before any network call.
    pub fn descriptor(&self) -> Result<Descriptor> {
        validate_name(&self.name)?;

        Ok(Descriptor::builder(&self.name)
            .set("name", &self.name)
            .opt("description", self.description.as_deref())
            .opt("homepage", self.homepage.as_deref())
            .opt("private", self.private)
            .opt("has_issues", self.has_issues)
            .opt("has_wiki", self.has_wiki)
            .opt("has_projects", self.has_projects)
            .opt("has_downloads", self.has_downloads)
            .opt("allow_merge_commit", self.allow_merge_commit)
            .opt("allow_squash_merge", self.allow_squash_merge)
            .opt("allow_rebase_merge", self.allow_rebase_merge)
            .opt("delete_branch_on_merge", self.delete_branch_on_merge)
            .opt("auto_init", self.auto_init)
            .opt("gitignore_template", self.gitignore_template.as_deref())
            .opt("license_template", self.license_template.as_deref())
            .clear_all(&self.clear)
            .build())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::validation(
            "name",
            format!("'{name}' may only contain ASCII letters, digits, '-', '_' and '.'"),
        ))
    }
}

/// Adapter for the repository endpoints of one owner.
///
/// Creation goes through `/user/repos` for the authenticated user or
/// `/orgs/{org}/repos` for an organization; everything else addresses
/// `/repos/{owner}/{name}`.
#[derive(Debug)]
pub struct RepositoryAdapter {
    client: GithubClient,
    owner: String,
    organization: bool,
}

impl RepositoryAdapter {
    /// Bind the adapter to an owner login.
    pub fn new(client: GithubClient, owner: impl Into<String>, organization: bool) -> Self {
        Self {
            client,
            owner: owner.into(),
            organization,
        }
    }

    fn item_path(&self, name: &str) -> String {
        format!("/repos/{}/{name}", self.owner)
    }

    fn create_path(&self) -> String {
        if self.organization {
            format!("/orgs/{}/repos", self.owner)
        } else {
            "/user/repos".to_string()
        }
    }
}

impl ResourceAdapter for RepositoryAdapter {
    fn find(&self, id: &str) -> Result<RemoteState> {
        self.client.get(&self.item_path(id))
    }

    fn create(&self, payload: &Map<String, Value>) -> Result<Value> {
        self.client
            .post(&self.create_path(), &Value::Object(payload.clone()))
    }

    fn edit(&self, id: &str, payload: &Map<String, Value>) -> Result<Value> {
        self.client
            .patch(&self.item_path(id), &Value::Object(payload.clone()))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.client.delete(&self.item_path(id))
    }
}

/// State module for repositories.
pub struct RepositoryModule<A: ResourceAdapter> {
    adapter: A,
    descriptor: Descriptor,
}

impl RepositoryModule<RepositoryAdapter> {
    /// Validate the spec and bind to an owner.
    pub fn new(
        client: GithubClient,
        owner: impl Into<String>,
        organization: bool,
        spec: &RepositorySpec,
    ) -> Result<Self> {
        Ok(Self {
            adapter: RepositoryAdapter::new(client, owner, organization),
            descriptor: spec.descriptor()?,
        })
    }
}

impl<A: ResourceAdapter> StateModule for RepositoryModule<A> {
    fn kind(&self) -> &'static str {
        "repository"
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
            "archived" => transition::ensure_field(
                &self.adapter,
                self.descriptor.identity(),
                "archived",
                json!(true),
                check_mode,
            ),
            other => Err(Error::unsupported_state(self.kind(), other)),
        }
    }
}
