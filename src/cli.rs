use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "octoset")]
#[command(version)]
#[command(about = "Declarative state management for GitHub resources", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Personal access token used for every API call
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Base URL of the REST API (override for GitHub Enterprise)
    #[arg(long, default_value = ghkit::DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Report what would change without writing anything
    #[arg(long, global = true)]
    pub check: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile a repository under a user or organization
    Repository(RepositoryArgs),

    /// Reconcile an issue label
    Label(LabelArgs),

    /// Reconcile a branch
    Branch(BranchArgs),

    /// Reconcile a committed file
    File(FileArgs),

    /// Reconcile a collaborator's permission
    Collaborator(CollaboratorArgs),

    /// Reconcile an actions secret
    Secret(SecretArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Coordinates shared by every repository-scoped resource.
#[derive(Args)]
pub struct RepoTarget {
    /// Account that owns the repository
    #[arg(long)]
    pub owner: String,

    /// Repository the resource lives in
    #[arg(long)]
    pub repo: String,
}

// ============================================================================
// Repository
// ============================================================================

#[derive(Args)]
pub struct RepositoryArgs {
    /// Repository name
    pub name: String,

    /// Account that owns the repository
    #[arg(long)]
    pub owner: String,

    /// Treat the owner as an organization
    #[arg(long)]
    pub organization: bool,

    /// Desired state
    #[arg(long, value_enum, default_value_t = RepositoryState::Present)]
    pub state: RepositoryState,

    /// Short description
    #[arg(long)]
    pub description: Option<String>,

    /// Homepage URL
    #[arg(long)]
    pub homepage: Option<String>,

    /// Private visibility
    #[arg(long, value_name = "BOOL")]
    pub private: Option<bool>,

    /// Enable the issues feature
    #[arg(long, value_name = "BOOL")]
    pub has_issues: Option<bool>,

    /// Enable the wiki feature
    #[arg(long, value_name = "BOOL")]
    pub has_wiki: Option<bool>,

    /// Enable the projects feature
    #[arg(long, value_name = "BOOL")]
    pub has_projects: Option<bool>,

    /// Enable downloads
    #[arg(long, value_name = "BOOL")]
    pub has_downloads: Option<bool>,

    /// Allow merge commits on pull requests
    #[arg(long, value_name = "BOOL")]
    pub allow_merge_commit: Option<bool>,

    /// Allow squash merging
    #[arg(long, value_name = "BOOL")]
    pub allow_squash_merge: Option<bool>,

    /// Allow rebase merging
    #[arg(long, value_name = "BOOL")]
    pub allow_rebase_merge: Option<bool>,

    /// Delete head branches after merge
    #[arg(long, value_name = "BOOL")]
    pub delete_branch_on_merge: Option<bool>,

    /// Create an initial commit (only honored at creation)
    #[arg(long, value_name = "BOOL")]
    pub auto_init: Option<bool>,

    /// Gitignore template name (only honored at creation)
    #[arg(long)]
    pub gitignore_template: Option<String>,

    /// License template keyword (only honored at creation)
    #[arg(long)]
    pub license_template: Option<String>,

    /// Reset a field to the service default (repeatable)
    #[arg(long, value_name = "FIELD")]
    pub clear: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RepositoryState {
    Present,
    Absent,
    Archived,
}

impl RepositoryState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Archived => "archived",
        }
    }
}

// ============================================================================
// Label
// ============================================================================

#[derive(Args)]
pub struct LabelArgs {
    /// Label name
    pub name: String,

    #[command(flatten)]
    pub target: RepoTarget,

    /// Desired state
    #[arg(long, value_enum, default_value_t = LabelState::Present)]
    pub state: LabelState,

    /// Six-digit hex color, without the leading '#'
    #[arg(long, default_value = "ededed")]
    pub color: String,

    /// Short description
    #[arg(long)]
    pub description: Option<String>,

    /// Reset a field to the service default (repeatable)
    #[arg(long, value_name = "FIELD")]
    pub clear: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LabelState {
    Present,
    Absent,
    Replace,
}

impl LabelState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Replace => "replace",
        }
    }
}

// ============================================================================
// Branch
// ============================================================================

#[derive(Args)]
pub struct BranchArgs {
    /// Branch name
    pub name: String,

    #[command(flatten)]
    pub target: RepoTarget,

    /// Desired state
    #[arg(long, value_enum, default_value_t = BranchState::Present)]
    pub state: BranchState,

    /// Branch to create from; the repository default branch when omitted
    #[arg(long)]
    pub source: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BranchState {
    Present,
    Absent,
    Default,
}

impl BranchState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Default => "default",
        }
    }
}

// ============================================================================
// File
// ============================================================================

#[derive(Args)]
pub struct FileArgs {
    /// Path of the file within the repository
    pub path: String,

    #[command(flatten)]
    pub target: RepoTarget,

    /// Desired state
    #[arg(long, value_enum, default_value_t = PresenceState::Present)]
    pub state: PresenceState,

    /// Inline desired content (mutually exclusive with --src)
    #[arg(long, conflicts_with = "src")]
    pub content: Option<String>,

    /// Local file to read the desired content from
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Branch to read and write; the repository default when omitted
    #[arg(long)]
    pub branch: Option<String>,

    /// Commit message
    #[arg(long)]
    pub message: Option<String>,
}

// ============================================================================
// Collaborator
// ============================================================================

#[derive(Args)]
pub struct CollaboratorArgs {
    /// Login of the collaborator
    pub username: String,

    #[command(flatten)]
    pub target: RepoTarget,

    /// Desired state
    #[arg(long, value_enum, default_value_t = PresenceState::Present)]
    pub state: PresenceState,

    /// Permission level: pull, triage, push, maintain or admin
    /// (write and read are accepted aliases)
    #[arg(long, default_value = "push")]
    pub permission: String,
}

// ============================================================================
// Secret
// ============================================================================

#[derive(Args)]
pub struct SecretArgs {
    /// Secret name
    pub name: String,

    #[command(flatten)]
    pub target: RepoTarget,

    /// Desired state
    #[arg(long, value_enum, default_value_t = PresenceState::Present)]
    pub state: PresenceState,

    /// Plaintext value; required for present
    #[arg(long, env = "OCTOSET_SECRET_VALUE", hide_env_values = true)]
    pub value: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PresenceState {
    Present,
    Absent,
}

impl PresenceState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}
