use std::collections::BTreeSet;

use tally_types::{AccountId, ObjectIndex};

use crate::objects::{AccountRoot, Credential, DepositPreauth, Escrow, LedgerObject};
use crate::reserve::ReserveConfig;

/// Read boundary over ledger state.
///
/// Implemented by the committed ledger and by the sandbox a transaction
/// applies into. Reads never mutate, including reads of expired objects.
pub trait ReadView {
    fn account(&self, id: &AccountId) -> Option<&AccountRoot>;

    fn object(&self, index: &ObjectIndex) -> Option<&LedgerObject>;

    /// The owner directory of `owner`, if it has any entries.
    fn owner_directory(&self, owner: &AccountId) -> Option<&BTreeSet<ObjectIndex>>;

    fn reserves(&self) -> &ReserveConfig;

    fn exists(&self, index: &ObjectIndex) -> bool {
        self.object(index).is_some()
    }

    fn account_exists(&self, id: &AccountId) -> bool {
        self.account(id).is_some()
    }

    /// Snapshot of the owner directory entries, in index order.
    fn owner_entries(&self, owner: &AccountId) -> Vec<ObjectIndex> {
        self.owner_directory(owner)
            .map(|dir| dir.iter().copied().collect())
            .unwrap_or_default()
    }

    fn credential(&self, index: &ObjectIndex) -> Option<&Credential> {
        self.object(index).and_then(LedgerObject::as_credential)
    }

    fn deposit_preauth(&self, index: &ObjectIndex) -> Option<&DepositPreauth> {
        self.object(index).and_then(LedgerObject::as_deposit_preauth)
    }

    fn escrow(&self, index: &ObjectIndex) -> Option<&Escrow> {
        self.object(index).and_then(LedgerObject::as_escrow)
    }
}

/// Write boundary used while applying a transaction.
///
/// These are raw entry operations; owner counts and directory membership are
/// kept consistent by the functions in [`crate::reserve`], which is the only
/// module that should call `put_object` / `erase_object` directly.
pub trait ApplyView: ReadView {
    fn put_account(&mut self, account: AccountRoot);

    fn erase_account(&mut self, id: &AccountId);

    fn put_object(&mut self, index: ObjectIndex, object: LedgerObject);

    fn erase_object(&mut self, index: &ObjectIndex);

    /// Returns `false` if the entry was already present.
    fn dir_insert(&mut self, owner: &AccountId, index: ObjectIndex) -> bool;

    /// Returns `false` if the entry was absent.
    fn dir_remove(&mut self, owner: &AccountId, index: &ObjectIndex) -> bool;
}
