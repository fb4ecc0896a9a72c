use std::collections::BTreeMap;

use tally_types::limits::{MAX_CREDENTIALS, MAX_CREDENTIAL_URI_LEN};
use tally_types::{AccountId, ObjectIndex};

use crate::error::LedgerError;
use crate::memory::InMemoryLedger;
use crate::objects::{LedgerObject, PreauthTarget};
use crate::traits::ReadView;

/// Result of a whole-ledger consistency check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub account_count: usize,
    pub object_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific inconsistency found in ledger state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Account id or object index the violation concerns.
    pub subject: String,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    OwnerCountMismatch,
    MissingDirectoryEntry,
    DanglingDirectoryEntry,
    MissingOwnerAccount,
    IndexMismatch,
    CredentialOwnership,
    CredentialShape,
    EscrowShape,
    PreauthShape,
    NegativeBalance,
}

/// Ledger-wide invariant checker.
///
/// Run after every applied transaction in tests; each check is a property the
/// transaction engine must preserve regardless of which transaction ran.
pub struct InvariantChecker;

impl InvariantChecker {
    pub fn check(ledger: &InMemoryLedger) -> ValidationReport {
        let mut violations = Vec::new();
        let mut owned: BTreeMap<AccountId, u32> = BTreeMap::new();

        for (index, object) in ledger.objects() {
            *owned.entry(object.reserve_owner()).or_default() += 1;
            check_object(ledger, index, object, &mut violations);
        }

        for root in ledger.accounts() {
            if root.balance.is_negative() {
                violations.push(Violation {
                    subject: root.id.to_string(),
                    kind: ViolationKind::NegativeBalance,
                    description: format!("balance is {}", root.balance),
                });
            }
            let expected = owned.get(&root.id).copied().unwrap_or(0);
            if root.owner_count != expected {
                violations.push(Violation {
                    subject: root.id.to_string(),
                    kind: ViolationKind::OwnerCountMismatch,
                    description: format!(
                        "owner count {} but owns {expected} objects",
                        root.owner_count
                    ),
                });
            }
        }

        for (owner, directory) in ledger.directories() {
            if !ledger.account_exists(owner) {
                violations.push(Violation {
                    subject: owner.to_string(),
                    kind: ViolationKind::MissingOwnerAccount,
                    description: "directory of a missing account".into(),
                });
            }
            for index in directory {
                let listed = ledger
                    .object(index)
                    .is_some_and(|o| o.directory_owners().contains(owner));
                if !listed {
                    violations.push(Violation {
                        subject: index.to_string(),
                        kind: ViolationKind::DanglingDirectoryEntry,
                        description: format!("listed in {owner}'s directory but not linked to it"),
                    });
                }
            }
        }

        ValidationReport {
            account_count: ledger.account_count(),
            object_count: ledger.object_count(),
            violations,
        }
    }

    /// Like [`InvariantChecker::check`], failing on the first violation.
    pub fn ensure(ledger: &InMemoryLedger) -> Result<(), LedgerError> {
        match Self::check(ledger).violations.into_iter().next() {
            None => Ok(()),
            Some(v) => Err(LedgerError::InvariantViolation(format!(
                "{:?} at {}: {}",
                v.kind, v.subject, v.description
            ))),
        }
    }
}

fn check_object(
    ledger: &InMemoryLedger,
    index: &ObjectIndex,
    object: &LedgerObject,
    violations: &mut Vec<Violation>,
) {
    let mut flag = |kind: ViolationKind, description: String| {
        violations.push(Violation {
            subject: index.to_string(),
            kind,
            description,
        })
    };

    if object.index() != *index {
        flag(ViolationKind::IndexMismatch, "stored under a foreign index".into());
    }

    for owner in object.directory_owners() {
        if !ledger.account_exists(&owner) {
            flag(ViolationKind::MissingOwnerAccount, format!("{owner} does not exist"));
        } else if !ledger
            .owner_directory(&owner)
            .is_some_and(|dir| dir.contains(index))
        {
            flag(ViolationKind::MissingDirectoryEntry, format!("absent from {owner}'s directory"));
        }
    }

    match object {
        LedgerObject::Credential(c) => {
            if c.is_self_issued() && !c.accepted {
                flag(
                    ViolationKind::CredentialOwnership,
                    "self-issued credential is not accepted".into(),
                );
            }
            if !c.credential_type.is_well_formed() {
                flag(ViolationKind::CredentialShape, "credential type out of range".into());
            }
            if c
                .uri
                .as_ref()
                .is_some_and(|uri| uri.is_empty() || uri.len() > MAX_CREDENTIAL_URI_LEN)
            {
                flag(ViolationKind::CredentialShape, "uri out of range".into());
            }
        }
        LedgerObject::DepositPreauth(p) => match &p.target {
            PreauthTarget::Account(authorized) if *authorized == p.owner => {
                flag(ViolationKind::PreauthShape, "account preauthorizes itself".into());
            }
            PreauthTarget::Credentials(set) if set.is_empty() || set.len() > MAX_CREDENTIALS => {
                flag(
                    ViolationKind::PreauthShape,
                    format!("credential set has {} entries", set.len()),
                );
            }
            _ => {}
        },
        LedgerObject::Escrow(e) => {
            if !e.amount.is_positive() {
                flag(ViolationKind::EscrowShape, format!("holds {}", e.amount));
            }
            if e.finish_after.is_none() && e.cancel_after.is_none() {
                flag(ViolationKind::EscrowShape, "no finish or cancel time".into());
            }
            if e.finish_after.is_none() && e.condition.is_none() {
                flag(ViolationKind::EscrowShape, "neither finish time nor condition".into());
            }
            if let (Some(finish), Some(cancel)) = (e.finish_after, e.cancel_after) {
                if !cancel.is_after(finish) {
                    flag(
                        ViolationKind::EscrowShape,
                        "cancel time does not follow finish time".into(),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{AccountRoot, Credential, DepositPreauth, Escrow};
    use crate::reserve;
    use crate::sandbox::Sandbox;
    use crate::traits::ApplyView;
    use tally_types::{Drops, LedgerTime};

    fn alice() -> AccountId {
        AccountId::from_seed("alice")
    }

    fn bob() -> AccountId {
        AccountId::from_seed("bob")
    }

    fn ledger() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::default();
        ledger.fund(alice(), Drops::new(10_000_000)).unwrap();
        ledger.fund(bob(), Drops::new(10_000_000)).unwrap();
        ledger
    }

    fn escrow() -> LedgerObject {
        LedgerObject::Escrow(Escrow {
            source: alice(),
            destination: bob(),
            amount: Drops::new(1_000),
            condition: None,
            finish_after: Some(LedgerTime::from_secs(10)),
            cancel_after: Some(LedgerTime::from_secs(20)),
            source_tag: None,
            destination_tag: None,
            sequence: 1,
        })
    }

    fn commit_insert(ledger: &mut InMemoryLedger, object: LedgerObject) -> ObjectIndex {
        let index = object.index();
        let mut sandbox = Sandbox::new(ledger);
        reserve::insert_object(&mut sandbox, index, object).unwrap();
        let changes = sandbox.commit();
        ledger.apply(changes);
        index
    }

    #[test]
    fn fresh_ledger_is_valid() {
        let report = InvariantChecker::check(&ledger());
        assert!(report.is_valid());
        assert_eq!(report.account_count, 2);
        assert_eq!(report.object_count, 0);
    }

    #[test]
    fn objects_created_through_reserve_are_valid() {
        let mut ledger = ledger();
        commit_insert(&mut ledger, escrow());
        commit_insert(
            &mut ledger,
            LedgerObject::DepositPreauth(DepositPreauth {
                owner: bob(),
                target: PreauthTarget::Account(alice()),
            }),
        );
        assert!(InvariantChecker::ensure(&ledger).is_ok());
    }

    #[test]
    fn detects_owner_count_drift() {
        let mut ledger = ledger();
        commit_insert(&mut ledger, escrow());
        let mut root = ledger.account(&alice()).unwrap().clone();
        root.owner_count = 0;
        ledger.update_account(root).unwrap();

        let report = InvariantChecker::check(&ledger);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::OwnerCountMismatch);
        assert!(matches!(
            InvariantChecker::ensure(&ledger),
            Err(LedgerError::InvariantViolation(_))
        ));
    }

    #[test]
    fn detects_unlinked_object() {
        let mut ledger = ledger();
        let object = escrow();
        let index = object.index();
        let mut sandbox = Sandbox::new(&ledger);
        sandbox.put_object(index, object);
        let changes = sandbox.commit();
        ledger.apply(changes);

        let kinds: Vec<_> = InvariantChecker::check(&ledger)
            .violations
            .into_iter()
            .map(|v| v.kind)
            .collect();
        assert!(kinds.contains(&ViolationKind::MissingDirectoryEntry));
        assert!(kinds.contains(&ViolationKind::OwnerCountMismatch));
    }

    #[test]
    fn detects_dangling_directory_entry() {
        let mut ledger = ledger();
        let mut sandbox = Sandbox::new(&ledger);
        sandbox.dir_insert(&alice(), ObjectIndex::from_hash([7; 32]));
        let changes = sandbox.commit();
        ledger.apply(changes);

        let report = InvariantChecker::check(&ledger);
        assert_eq!(report.violations[0].kind, ViolationKind::DanglingDirectoryEntry);
    }

    #[test]
    fn detects_pending_self_issued_credential() {
        let mut ledger = ledger();
        commit_insert(
            &mut ledger,
            LedgerObject::Credential(Credential {
                subject: alice(),
                issuer: alice(),
                credential_type: "kyc".into(),
                uri: None,
                expiration: None,
                accepted: false,
            }),
        );
        let report = InvariantChecker::check(&ledger);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::CredentialOwnership);
    }

    #[test]
    fn detects_negative_balance() {
        let mut ledger = ledger();
        let mut root = AccountRoot::new(alice(), Drops::new(-1));
        root.owner_count = 0;
        ledger.update_account(root).unwrap();
        let report = InvariantChecker::check(&ledger);
        assert_eq!(report.violations[0].kind, ViolationKind::NegativeBalance);
    }
}
