//! Reserve and owner-directory accounting.
//!
//! Every object creation and deletion goes through this module so that, for
//! each account, the owner count equals the number of reserve-bearing objects
//! it owns and every object is listed in the directory of each account it
//! references.

use serde::{Deserialize, Serialize};
use tally_types::{AccountId, Drops, ObjectIndex, TxError, TxResult};
use tracing::debug;

use crate::objects::LedgerObject;
use crate::traits::ApplyView;

/// Minimum balance an account must hold: `base + increment * owner_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReserveConfig {
    pub base: Drops,
    pub increment: Drops,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            base: Drops::new(1_000_000),
            increment: Drops::new(200_000),
        }
    }
}

impl ReserveConfig {
    /// Reserve required to own `owner_count` objects. Saturates rather than
    /// overflowing, which can only make the requirement stricter.
    pub fn required(&self, owner_count: u32) -> Drops {
        self.increment
            .checked_mul(owner_count)
            .and_then(|extra| self.base.checked_add(extra))
            .unwrap_or(Drops::new(i64::MAX))
    }
}

/// Fail with `InsufficientReserve` unless `balance` covers the reserve for
/// `owner_count` objects.
pub fn check_reserve(reserves: &ReserveConfig, balance: Drops, owner_count: u32) -> TxResult {
    if balance < reserves.required(owner_count) {
        return Err(TxError::InsufficientReserve);
    }
    Ok(())
}

/// Create `object` if its reserve owner can afford one more object.
///
/// `balance` is the balance the reserve is measured against; for the
/// submitting account that is its balance before the fee was charged.
pub fn try_add_object<V: ApplyView + ?Sized>(
    view: &mut V,
    index: ObjectIndex,
    object: LedgerObject,
    balance: Drops,
) -> TxResult {
    let owner = object.reserve_owner();
    let owner_count = view
        .account(&owner)
        .map(|root| root.owner_count)
        .ok_or_else(|| TxError::internal(format!("reserve owner {owner} missing")))?;
    check_reserve(view.reserves(), balance, owner_count.saturating_add(1))?;
    insert_object(view, index, object)
}

/// Create `object` without a reserve check.
pub fn insert_object<V: ApplyView + ?Sized>(
    view: &mut V,
    index: ObjectIndex,
    object: LedgerObject,
) -> TxResult {
    if view.exists(&index) {
        return Err(TxError::internal(format!("object {index} already present")));
    }
    for owner in object.directory_owners() {
        if !view.account_exists(&owner) {
            return Err(TxError::internal(format!("directory owner {owner} missing")));
        }
        view.dir_insert(&owner, index);
    }
    adjust_owner_count(view, &object.reserve_owner(), 1)?;
    debug!(kind = %object.kind(), index = %index.short_hex(), "object created");
    view.put_object(index, object);
    Ok(())
}

/// Delete an object, release its reserve, and drop every directory entry.
///
/// Fails only when the ledger is already inconsistent.
pub fn remove_object<V: ApplyView + ?Sized>(view: &mut V, index: &ObjectIndex) -> TxResult {
    let object = view
        .object(index)
        .cloned()
        .ok_or_else(|| TxError::internal(format!("object {index} missing")))?;
    for owner in object.directory_owners() {
        view.dir_remove(&owner, index);
    }
    adjust_owner_count(view, &object.reserve_owner(), -1)?;
    view.erase_object(index);
    debug!(kind = %object.kind(), index = %index.short_hex(), "object removed");
    Ok(())
}

/// Replace an existing object in place. When the replacement has a different
/// reserve owner, one unit of owner count moves with it; directory entries
/// follow the replacement's directory owners.
pub fn replace_object<V: ApplyView + ?Sized>(
    view: &mut V,
    index: ObjectIndex,
    object: LedgerObject,
) -> TxResult {
    let previous = view
        .object(&index)
        .cloned()
        .ok_or_else(|| TxError::internal(format!("object {index} missing")))?;

    let (before, after) = (previous.reserve_owner(), object.reserve_owner());
    if before != after {
        transfer_reserve(view, &before, &after)?;
    }

    let old_owners = previous.directory_owners();
    let new_owners = object.directory_owners();
    for owner in old_owners.iter().filter(|o| !new_owners.contains(o)) {
        view.dir_remove(owner, &index);
    }
    for owner in new_owners.iter().filter(|o| !old_owners.contains(o)) {
        view.dir_insert(owner, index);
    }

    view.put_object(index, object);
    Ok(())
}

/// Move one unit of owner count from `from` to `to` within the same view.
pub fn transfer_reserve<V: ApplyView + ?Sized>(
    view: &mut V,
    from: &AccountId,
    to: &AccountId,
) -> TxResult {
    adjust_owner_count(view, from, -1)?;
    adjust_owner_count(view, to, 1)
}

/// Apply `delta` to an account's owner count.
pub fn adjust_owner_count<V: ApplyView + ?Sized>(
    view: &mut V,
    account: &AccountId,
    delta: i32,
) -> TxResult {
    let mut root = view
        .account(account)
        .cloned()
        .ok_or_else(|| TxError::internal(format!("account {account} missing")))?;
    root.owner_count = root
        .owner_count
        .checked_add_signed(delta)
        .ok_or_else(|| TxError::internal(format!("owner count of {account} out of range")))?;
    view.put_account(root);
    Ok(())
}
