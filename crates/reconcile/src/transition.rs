//! Named state transitions.
//!
//! Each transition is an independent operation over (descriptor, observed
//! remote state, check mode): observe once with `find`, then issue at most
//! one mutating call. Under check mode no mutating call is made, but the
//! returned [`Outcome`] still carries the `changed` flag the real apply
//! would produce, plus either the existing remote representation or the
//! unapplied descriptor payload for a simulated create.
//!
//! Adapter failures propagate unchanged; a transition that failed mid-apply
//! is never reported as changed.

use crate::adapter::ResourceAdapter;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::state::{Outcome, RemoteState};
use serde_json::{Map, Value};

/// What `present` does when the resource already exists.
///
/// This is fixed per resource type at design time, not negotiated at
/// runtime: labels and repositories converge toward the descriptor, while
/// a branch either exists or it does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresencePolicy {
    /// Edit the existing resource toward the descriptor (same as `replace`).
    Converge,
    /// Leave the existing resource untouched and report no change.
    LeaveExisting,
}

/// Ensure the resource does not exist.
pub fn absent(adapter: &dyn ResourceAdapter, id: &str, check_mode: bool) -> Result<Outcome> {
    if !adapter.find(id)?.is_found() {
        return Ok(Outcome::unchanged(None));
    }

    if !check_mode {
        adapter.delete(id)?;
    }

    Ok(Outcome::changed(None))
}

/// Ensure the resource exists.
///
/// When it does not, it is created from the descriptor payload. When it
/// does, behavior follows the resource type's [`PresencePolicy`].
pub fn present(
    adapter: &dyn ResourceAdapter,
    descriptor: &Descriptor,
    policy: PresencePolicy,
    create_only: &[&str],
    check_mode: bool,
) -> Result<Outcome> {
    let remote = adapter.find(descriptor.identity())?;

    match (&remote, policy) {
        (RemoteState::NotFound, _) => create(adapter, descriptor, check_mode),
        (RemoteState::Found(_), PresencePolicy::Converge) => {
            converge(adapter, descriptor, &remote, create_only, check_mode)
        }
        (RemoteState::Found(_), PresencePolicy::LeaveExisting) => {
            Ok(Outcome::unchanged(Some(remote.to_value())))
        }
    }
}

/// Ensure the resource exists and matches the descriptor exactly on all
/// managed fields, creating or editing as needed.
pub fn replace(
    adapter: &dyn ResourceAdapter,
    descriptor: &Descriptor,
    create_only: &[&str],
    check_mode: bool,
) -> Result<Outcome> {
    let remote = adapter.find(descriptor.identity())?;

    if remote.is_found() {
        converge(adapter, descriptor, &remote, create_only, check_mode)
    } else {
        create(adapter, descriptor, check_mode)
    }
}

/// Ensure a single field of an existing resource holds the given value
/// (flag transitions such as archive or set-default).
///
/// The resource must exist; a missing resource surfaces as the not-found
/// remote error the underlying lookup stands for.
pub fn ensure_field(
    adapter: &dyn ResourceAdapter,
    id: &str,
    field: &str,
    value: Value,
    check_mode: bool,
) -> Result<Outcome> {
    let remote = adapter.find(id)?;

    let RemoteState::Found(_) = remote else {
        return Err(Error::Remote {
            status: 404,
            body: format!("cannot update '{field}': resource '{id}' does not exist"),
        });
    };

    if remote.get(field) == Some(&value) {
        return Ok(Outcome::unchanged(Some(remote.to_value())));
    }

    if check_mode {
        return Ok(Outcome::changed(Some(remote.to_value())));
    }

    let payload: Map<String, Value> = [(field.to_string(), value)].into_iter().collect();
    let updated = adapter.edit(id, &payload)?;
    Ok(Outcome::changed(Some(updated)))
}

fn create(
    adapter: &dyn ResourceAdapter,
    descriptor: &Descriptor,
    check_mode: bool,
) -> Result<Outcome> {
    if check_mode {
        // Unapplied descriptor snapshot stands in for the created resource.
        return Ok(Outcome::changed(Some(Value::Object(descriptor.payload()))));
    }

    let created = adapter.create(&descriptor.payload())?;
    Ok(Outcome::changed(Some(created)))
}

fn converge(
    adapter: &dyn ResourceAdapter,
    descriptor: &Descriptor,
    remote: &RemoteState,
    create_only: &[&str],
    check_mode: bool,
) -> Result<Outcome> {
    if descriptor.matches(remote) {
        return Ok(Outcome::unchanged(Some(remote.to_value())));
    }

    if check_mode {
        return Ok(Outcome::changed(Some(remote.to_value())));
    }

    let payload = descriptor.payload_without(create_only);
    let updated = adapter.edit(descriptor.identity(), &payload)?;
    Ok(Outcome::changed(Some(updated)))
}

/// Capability-based dispatch for one resource type.
///
/// Every resource type implements the fixed `present`/`absent` pair and
/// may accept additional named transitions by overriding [`transition`].
/// Unknown discriminators raise [`Error::Unsupported`] without touching
/// the adapter.
///
/// [`transition`]: StateModule::transition
pub trait StateModule {
    /// Resource type name, e.g. "label".
    fn kind(&self) -> &'static str;

    /// Ensure the resource exists (per-type presence policy).
    fn present(&self, check_mode: bool) -> Result<Outcome>;

    /// Ensure the resource does not exist.
    fn absent(&self, check_mode: bool) -> Result<Outcome>;

    /// Hook for additional named transitions (archived, default, ...).
    fn transition(&self, state: &str, check_mode: bool) -> Result<Outcome> {
        let _ = check_mode;
        Err(Error::unsupported_state(self.kind(), state))
    }

    /// Map a state discriminator to its transition and run it.
    fn apply(&self, state: &str, check_mode: bool) -> Result<Outcome> {
        log::info!(
            "applying state '{state}' for {}{}",
            self.kind(),
            if check_mode { " (check mode)" } else { "" }
        );

        match state {
            "present" => self.present(check_mode),
            "absent" => self.absent(check_mode),
            other => self.transition(other, check_mode),
        }
    }
}
