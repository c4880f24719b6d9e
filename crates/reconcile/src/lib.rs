//! # reconcile
//!
//! A small framework for declarative remote-resource reconciliation:
//! declare desired state, observe actual state, apply the minimal change,
//! report whether anything changed.
//!
//! ## Core concepts
//!
//! - [`Descriptor`]: desired configuration for one resource instance,
//!   with three-valued field semantics ([`FieldValue`]) so "no opinion"
//!   is distinct from "clear this field"
//! - [`RemoteState`]: the observed resource, or a `NotFound` sentinel
//! - [`ResourceAdapter`]: the find/create/edit/delete boundary to the
//!   concrete remote API
//! - [`transition`]: the named state transitions (`present`, `absent`,
//!   `replace`, single-flag updates) and the [`StateModule`] dispatcher
//!
//! ## Example
//!
//! ```
//! use reconcile::{Descriptor, MockAdapter, PresencePolicy, transition};
//!
//! let desired = Descriptor::builder("bug")
//!     .set("name", "bug")
//!     .set("color", "ff0000")
//!     .build();
//!
//! let adapter = MockAdapter::not_found();
//! let outcome =
//!     transition::present(&adapter, &desired, PresencePolicy::Converge, &[], false).unwrap();
//! assert!(outcome.changed);
//!
//! // A second run converges to "no change".
//! let outcome =
//!     transition::present(&adapter, &desired, PresencePolicy::Converge, &[], false).unwrap();
//! assert!(!outcome.changed);
//! ```
//!
//! Check mode is threaded through every transition: with it enabled no
//! mutating adapter call is made, while the returned [`Outcome`] still
//! reports the `changed` flag a real apply would produce.

pub mod adapter;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod state;
pub mod transition;

pub use adapter::{AdapterCall, MockAdapter, ResourceAdapter};
pub use descriptor::{Descriptor, DescriptorBuilder};
pub use error::{Error, Result};
pub use field::FieldValue;
pub use state::{Outcome, RemoteState};
pub use transition::{PresencePolicy, StateModule};
