//! Credential resolution and removal.
//!
//! Resolving a credential never deletes it. An expired credential is
//! reported as [`CredentialLookup::Expired`] and the caller decides whether
//! to remove it with [`delete_expired`], so the deletion is always visible in
//! the caller's code path and its tests.

use tally_types::{LedgerTime, ObjectIndex, TxError, TxResult};
use tracing::debug;

use crate::objects::Credential;
use crate::reserve;
use crate::traits::{ApplyView, ReadView};

/// Result of resolving a credential index at a given close time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialLookup {
    /// No credential at this index.
    Missing,
    /// Present and not expired.
    Live(Credential),
    /// Present but past its expiration; due for deletion.
    Expired(Credential),
}

impl CredentialLookup {
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired(_))
    }
}

/// Resolve `index` to a credential, classifying it against `now`.
pub fn resolve<V: ReadView + ?Sized>(view: &V, index: &ObjectIndex, now: LedgerTime) -> CredentialLookup {
    match view.credential(index) {
        None => CredentialLookup::Missing,
        Some(c) if c.is_expired(now) => CredentialLookup::Expired(c.clone()),
        Some(c) => CredentialLookup::Live(c.clone()),
    }
}

/// Delete a credential, releasing the reserve of whichever party holds it.
pub fn delete<V: ApplyView + ?Sized>(view: &mut V, index: &ObjectIndex) -> TxResult {
    if view.credential(index).is_none() {
        return Err(TxError::internal(format!("credential {index} missing")));
    }
    reserve::remove_object(view, index)
}

/// Delete every listed credential that is still present and expired at
/// `now`. Indexes already gone are skipped, so the same list can be applied
/// to a view more than once.
pub fn delete_expired<V: ApplyView + ?Sized>(
    view: &mut V,
    indexes: &[ObjectIndex],
    now: LedgerTime,
) -> TxResult {
    for index in indexes {
        if resolve(view, index, now).is_expired() {
            debug!(index = %index.short_hex(), "removing expired credential");
            delete(view, index)?;
        }
    }
    Ok(())
}
