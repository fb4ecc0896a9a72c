use std::collections::{BTreeMap, BTreeSet};

use tally_types::{AccountId, Drops, ObjectIndex};
use tracing::debug;

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::objects::{AccountRoot, LedgerObject};
use crate::reserve::ReserveConfig;
use crate::sandbox::ChangeSet;
use crate::traits::ReadView;

/// In-memory committed ledger state.
///
/// All maps are ordered so that iteration, and therefore every derived
/// result, is identical on every node.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    reserves: ReserveConfig,
    accounts: BTreeMap<AccountId, AccountRoot>,
    objects: BTreeMap<ObjectIndex, LedgerObject>,
    directories: BTreeMap<AccountId, BTreeSet<ObjectIndex>>,
}

impl InMemoryLedger {
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_reserves(config.reserves)
    }

    pub fn with_reserves(reserves: ReserveConfig) -> Self {
        Self {
            reserves,
            ..Self::default()
        }
    }

    /// Seed an account directly. Account creation is the surrounding
    /// pipeline's concern; this exists for genesis state and tests.
    pub fn fund(&mut self, id: AccountId, balance: Drops) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&id) {
            return Err(LedgerError::AccountExists(id));
        }
        self.accounts.insert(id, AccountRoot::new(id, balance));
        debug!(account = %id, %balance, "funded account");
        Ok(())
    }

    /// Replace an existing account root, e.g. to seed flags.
    pub fn update_account(&mut self, account: AccountRoot) -> Result<(), LedgerError> {
        match self.accounts.get_mut(&account.id) {
            Some(slot) => {
                *slot = account;
                Ok(())
            }
            None => Err(LedgerError::AccountNotFound(account.id)),
        }
    }

    /// Commit a sandbox's staged changes.
    pub fn apply(&mut self, changes: ChangeSet) {
        let (accounts, objects, directories) = changes.into_parts();
        for (id, account) in accounts {
            match account {
                Some(account) => {
                    self.accounts.insert(id, account);
                }
                None => {
                    self.accounts.remove(&id);
                }
            }
        }
        for (index, object) in objects {
            match object {
                Some(object) => {
                    self.objects.insert(index, object);
                }
                None => {
                    self.objects.remove(&index);
                }
            }
        }
        for (owner, dir) in directories {
            if dir.is_empty() {
                self.directories.remove(&owner);
            } else {
                self.directories.insert(owner, dir);
            }
        }
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountRoot> {
        self.accounts.values()
    }

    pub fn objects(&self) -> impl Iterator<Item = (&ObjectIndex, &LedgerObject)> {
        self.objects.iter()
    }

    pub fn directories(&self) -> impl Iterator<Item = (&AccountId, &BTreeSet<ObjectIndex>)> {
        self.directories.iter()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl ReadView for InMemoryLedger {
    fn account(&self, id: &AccountId) -> Option<&AccountRoot> {
        self.accounts.get(id)
    }

    fn object(&self, index: &ObjectIndex) -> Option<&LedgerObject> {
        self.objects.get(index)
    }

    fn owner_directory(&self, owner: &AccountId) -> Option<&BTreeSet<ObjectIndex>> {
        self.directories.get(owner)
    }

    fn reserves(&self) -> &ReserveConfig {
        &self.reserves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::Sandbox;
    use crate::traits::ApplyView;

    fn alice() -> AccountId {
        AccountId::from_seed("alice")
    }

    #[test]
    fn fund_creates_account_at_sequence_one() {
        let mut ledger = InMemoryLedger::default();
        ledger.fund(alice(), Drops::new(500)).unwrap();
        let root = ledger.account(&alice()).unwrap();
        assert_eq!(root.sequence, 1);
        assert_eq!(root.balance, Drops::new(500));
        assert_eq!(root.owner_count, 0);
    }

    #[test]
    fn fund_twice_is_rejected() {
        let mut ledger = InMemoryLedger::default();
        ledger.fund(alice(), Drops::new(1)).unwrap();
        assert_eq!(
            ledger.fund(alice(), Drops::new(1)),
            Err(LedgerError::AccountExists(alice()))
        );
    }

    #[test]
    fn update_account_requires_existing_account() {
        let mut ledger = InMemoryLedger::default();
        let root = AccountRoot::new(alice(), Drops::new(1));
        assert_eq!(
            ledger.update_account(root),
            Err(LedgerError::AccountNotFound(alice()))
        );
    }

    #[test]
    fn apply_drops_emptied_directories() {
        let mut ledger = InMemoryLedger::default();
        ledger.fund(alice(), Drops::new(1)).unwrap();
        let index = ObjectIndex::from_hash([3; 32]);

        let mut sandbox = Sandbox::new(&ledger);
        sandbox.dir_insert(&alice(), index);
        let changes = sandbox.commit();
        ledger.apply(changes);
        assert_eq!(ledger.owner_entries(&alice()), vec![index]);

        let mut sandbox = Sandbox::new(&ledger);
        sandbox.dir_remove(&alice(), &index);
        let changes = sandbox.commit();
        ledger.apply(changes);
        assert!(ledger.owner_directory(&alice()).is_none());
        assert_eq!(ledger.directories().count(), 0);
    }
}
