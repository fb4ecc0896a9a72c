use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tally_types::{AccountId, ObjectIndex};

use crate::objects::{AccountRoot, LedgerObject};
use crate::reserve::ReserveConfig;
use crate::traits::{ApplyView, ReadView};

/// One committed mutation, with the entry's prior state where it had one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryChange {
    AccountCreated {
        after: AccountRoot,
    },
    AccountModified {
        before: AccountRoot,
        after: AccountRoot,
    },
    AccountDeleted {
        before: AccountRoot,
    },
    ObjectCreated {
        index: ObjectIndex,
        after: LedgerObject,
    },
    ObjectModified {
        index: ObjectIndex,
        before: LedgerObject,
        after: LedgerObject,
    },
    ObjectDeleted {
        index: ObjectIndex,
        before: LedgerObject,
    },
}

/// Staged mutations of one transaction.
///
/// Produced by [`Sandbox::commit`] and applied in one step by
/// [`crate::InMemoryLedger::apply`]; dropping a sandbox instead discards
/// every mutation it staged.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    accounts: BTreeMap<AccountId, Option<AccountRoot>>,
    objects: BTreeMap<ObjectIndex, Option<LedgerObject>>,
    directories: BTreeMap<AccountId, BTreeSet<ObjectIndex>>,
    entries: Vec<EntryChange>,
}

impl ChangeSet {
    /// Entry-level description of the changes, accounts first, each group in
    /// key order. Directory updates are implied by object changes.
    pub fn entries(&self) -> &[EntryChange] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.directories.is_empty()
    }

    #[allow(clippy::type_complexity)]
    pub(crate) fn into_parts(
        self,
    ) -> (
        BTreeMap<AccountId, Option<AccountRoot>>,
        BTreeMap<ObjectIndex, Option<LedgerObject>>,
        BTreeMap<AccountId, BTreeSet<ObjectIndex>>,
    ) {
        (self.accounts, self.objects, self.directories)
    }
}

/// Copy-on-write overlay over a read-only base view.
///
/// Every transaction applies into a fresh sandbox. Reads fall through to the
/// base for anything the sandbox has not touched.
pub struct Sandbox<'a> {
    base: &'a dyn ReadView,
    accounts: BTreeMap<AccountId, Option<AccountRoot>>,
    objects: BTreeMap<ObjectIndex, Option<LedgerObject>>,
    directories: BTreeMap<AccountId, BTreeSet<ObjectIndex>>,
}

impl<'a> Sandbox<'a> {
    pub fn new(base: &'a dyn ReadView) -> Self {
        Self {
            base,
            accounts: BTreeMap::new(),
            objects: BTreeMap::new(),
            directories: BTreeMap::new(),
        }
    }

    /// Close the sandbox, describing every change against the base.
    pub fn commit(self) -> ChangeSet {
        let mut entries = Vec::new();

        for (id, after) in &self.accounts {
            match (self.base.account(id), after) {
                (None, Some(after)) => entries.push(EntryChange::AccountCreated {
                    after: after.clone(),
                }),
                (Some(before), Some(after)) if before != after => {
                    entries.push(EntryChange::AccountModified {
                        before: before.clone(),
                        after: after.clone(),
                    })
                }
                (Some(before), None) => entries.push(EntryChange::AccountDeleted {
                    before: before.clone(),
                }),
                _ => {}
            }
        }

        for (index, after) in &self.objects {
            match (self.base.object(index), after) {
                (None, Some(after)) => entries.push(EntryChange::ObjectCreated {
                    index: *index,
                    after: after.clone(),
                }),
                (Some(before), Some(after)) if before != after => {
                    entries.push(EntryChange::ObjectModified {
                        index: *index,
                        before: before.clone(),
                        after: after.clone(),
                    })
                }
                (Some(before), None) => entries.push(EntryChange::ObjectDeleted {
                    index: *index,
                    before: before.clone(),
                }),
                _ => {}
            }
        }

        ChangeSet {
            accounts: self.accounts,
            objects: self.objects,
            directories: self.directories,
            entries,
        }
    }
}

impl ReadView for Sandbox<'_> {
    fn account(&self, id: &AccountId) -> Option<&AccountRoot> {
        match self.accounts.get(id) {
            Some(slot) => slot.as_ref(),
            None => self.base.account(id),
        }
    }

    fn object(&self, index: &ObjectIndex) -> Option<&LedgerObject> {
        match self.objects.get(index) {
            Some(slot) => slot.as_ref(),
            None => self.base.object(index),
        }
    }

    fn owner_directory(&self, owner: &AccountId) -> Option<&BTreeSet<ObjectIndex>> {
        match self.directories.get(owner) {
            Some(dir) if dir.is_empty() => None,
            Some(dir) => Some(dir),
            None => self.base.owner_directory(owner),
        }
    }

    fn reserves(&self) -> &ReserveConfig {
        self.base.reserves()
    }
}

impl ApplyView for Sandbox<'_> {
    fn put_account(&mut self, account: AccountRoot) {
        self.accounts.insert(account.id, Some(account));
    }

    fn erase_account(&mut self, id: &AccountId) {
        self.accounts.insert(*id, None);
    }

    fn put_object(&mut self, index: ObjectIndex, object: LedgerObject) {
        self.objects.insert(index, Some(object));
    }

    fn erase_object(&mut self, index: &ObjectIndex) {
        self.objects.insert(*index, None);
    }

    fn dir_insert(&mut self, owner: &AccountId, index: ObjectIndex) -> bool {
        let base = self.base;
        self.directories
            .entry(*owner)
            .or_insert_with(|| base.owner_directory(owner).cloned().unwrap_or_default())
            .insert(index)
    }

    fn dir_remove(&mut self, owner: &AccountId, index: &ObjectIndex) -> bool {
        let base = self.base;
        self.directories
            .entry(*owner)
            .or_insert_with(|| base.owner_directory(owner).cloned().unwrap_or_default())
            .remove(index)
    }
}
