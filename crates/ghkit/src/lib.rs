//! GitHub REST bindings for the reconcile engine.
//!
//! [`GithubClient`] is a thin blocking HTTP layer that maps 404 to
//! [`reconcile::RemoteState::NotFound`] and every other non-2xx status
//! to [`reconcile::Error::Remote`]. On top of it, each supported
//! resource ships a spec (validated user input), an adapter (the four
//! REST verbs) and a state module wiring both into the engine:
//!
//! - [`repository`]: user and organization repositories
//! - [`label`]: issue labels
//! - [`branch`]: branches, created from a source ref
//! - [`file`]: repository contents, compared byte for byte
//! - [`collaborator`]: collaborator permissions
//! - [`secret`]: actions secrets, sealed-box encrypted client-side

pub mod branch;
pub mod client;
pub mod collaborator;
pub mod file;
pub mod label;
pub mod repository;
pub mod secret;

pub use branch::{BranchModule, BranchSpec};
pub use client::{API_VERSION, DEFAULT_API_URL, GithubClient};
pub use collaborator::{CollaboratorModule, CollaboratorSpec};
pub use file::{FileModule, FileSpec};
pub use label::{LabelModule, LabelSpec};
pub use repository::{RepositoryModule, RepositorySpec};
pub use secret::{SecretModule, SecretSpec};
