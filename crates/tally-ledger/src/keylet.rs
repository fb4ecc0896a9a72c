//! Deterministic object addressing.
//!
//! A keylet pairs an object kind with the index derived from that kind's
//! identity fields. Keylets never consult ledger state, so any party can
//! compute the index of an object before it exists.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tally_crypto::IndexHasher;
use tally_types::{AccountId, CredentialSpec, CredentialType, ObjectIndex};

use crate::objects::ObjectKind;

/// An object kind and its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keylet {
    pub kind: ObjectKind,
    pub index: ObjectIndex,
}

impl Keylet {
    fn new(kind: ObjectKind, index: ObjectIndex) -> Self {
        Self { kind, index }
    }
}

pub fn account(id: &AccountId) -> Keylet {
    Keylet::new(
        ObjectKind::Account,
        IndexHasher::ACCOUNT.index(&[id.as_bytes()]),
    )
}

/// Fields are hashed in role order: subject, issuer, type. Swapping subject
/// and issuer addresses a different credential.
pub fn credential(
    subject: &AccountId,
    issuer: &AccountId,
    credential_type: &CredentialType,
) -> Keylet {
    Keylet::new(
        ObjectKind::Credential,
        IndexHasher::CREDENTIAL.index(&[
            subject.as_bytes(),
            issuer.as_bytes(),
            credential_type.as_bytes(),
        ]),
    )
}

pub fn deposit_preauth(owner: &AccountId, authorized: &AccountId) -> Keylet {
    Keylet::new(
        ObjectKind::DepositPreauth,
        IndexHasher::DEPOSIT_PREAUTH.index(&[owner.as_bytes(), authorized.as_bytes()]),
    )
}

/// The set is hashed in its canonical order, so the index does not depend on
/// the order credentials were submitted in.
pub fn deposit_preauth_credentials(
    owner: &AccountId,
    specs: &BTreeSet<CredentialSpec>,
) -> Keylet {
    let mut fields: Vec<&[u8]> = Vec::with_capacity(1 + specs.len() * 2);
    fields.push(owner.as_bytes());
    for spec in specs {
        fields.push(spec.issuer.as_bytes());
        fields.push(spec.credential_type.as_bytes());
    }
    Keylet::new(
        ObjectKind::DepositPreauth,
        IndexHasher::DEPOSIT_PREAUTH_CREDENTIALS.index(&fields),
    )
}

pub fn escrow(source: &AccountId, sequence: u32) -> Keylet {
    Keylet::new(
        ObjectKind::Escrow,
        IndexHasher::ESCROW.index(&[source.as_bytes(), &sequence.to_be_bytes()]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from_seed("alice")
    }

    fn bob() -> AccountId {
        AccountId::from_seed("bob")
    }

    #[test]
    fn credential_roles_are_not_symmetric() {
        let kyc = CredentialType::from("kyc");
        assert_ne!(
            credential(&alice(), &bob(), &kyc),
            credential(&bob(), &alice(), &kyc)
        );
    }

    #[test]
    fn credential_type_distinguishes() {
        assert_ne!(
            credential(&alice(), &bob(), &"kyc".into()),
            credential(&alice(), &bob(), &"aml".into())
        );
    }

    #[test]
    fn preauth_credentials_ignore_submission_order() {
        let a = CredentialSpec::new(alice(), "a");
        let b = CredentialSpec::new(bob(), "b");
        let c = CredentialSpec::new(alice(), "c");
        let forward: BTreeSet<_> = [a.clone(), b.clone(), c.clone()].into_iter().collect();
        let backward: BTreeSet<_> = [c, a, b].into_iter().collect();
        assert_eq!(
            deposit_preauth_credentials(&alice(), &forward),
            deposit_preauth_credentials(&alice(), &backward)
        );
    }

    #[test]
    fn preauth_kinds_do_not_collide() {
        let single: BTreeSet<_> = [CredentialSpec::new(bob(), "")].into_iter().collect();
        assert_ne!(
            deposit_preauth(&alice(), &bob()).index,
            deposit_preauth_credentials(&alice(), &single).index
        );
    }

    #[test]
    fn escrow_depends_on_sequence() {
        assert_ne!(escrow(&alice(), 1), escrow(&alice(), 2));
        assert_eq!(escrow(&alice(), 1).kind, ObjectKind::Escrow);
    }

    #[test]
    fn account_keylet_is_stable() {
        assert_eq!(account(&alice()), account(&alice()));
    }
}
