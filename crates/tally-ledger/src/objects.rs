use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tally_types::{AccountId, CredentialSpec, CredentialType, Drops, LedgerTime, ObjectIndex};

use crate::keylet;

// ---------------------------------------------------------------------------
// AccountRoot
// ---------------------------------------------------------------------------

/// Account-level settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFlags {
    /// Incoming value and escrow finishes need the account's permission.
    pub deposit_auth: bool,
    /// Advisory refusal of incoming native value. Superseded by
    /// `deposit_auth` when both are set.
    pub disallow_incoming_native: bool,
    /// Incoming value must carry a destination tag.
    pub require_dest_tag: bool,
}

/// The ledger entry describing an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoot {
    pub id: AccountId,
    /// Sequence number the next transaction from this account must carry.
    pub sequence: u32,
    pub balance: Drops,
    /// Number of reserve-bearing objects this account owns.
    pub owner_count: u32,
    pub flags: AccountFlags,
}

impl AccountRoot {
    pub fn new(id: AccountId, balance: Drops) -> Self {
        Self {
            id,
            sequence: 1,
            balance,
            owner_count: 0,
            flags: AccountFlags::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// A claim issued by one account about another.
///
/// Pending credentials are owned (for reserve purposes) by the issuer;
/// accepted ones by the subject. Both parties' owner directories reference
/// the credential for its whole life.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub subject: AccountId,
    pub issuer: AccountId,
    pub credential_type: CredentialType,
    pub uri: Option<Vec<u8>>,
    pub expiration: Option<LedgerTime>,
    pub accepted: bool,
}

impl Credential {
    /// The account that carries the reserve for this credential.
    pub fn owner(&self) -> AccountId {
        if self.accepted {
            self.subject
        } else {
            self.issuer
        }
    }

    /// Expired once the close time is strictly past the expiration.
    pub fn is_expired(&self, now: LedgerTime) -> bool {
        self.expiration.is_some_and(|exp| now.is_after(exp))
    }

    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    /// The (issuer, type) pair this credential satisfies in a preauth list.
    pub fn spec(&self) -> CredentialSpec {
        CredentialSpec {
            issuer: self.issuer,
            credential_type: self.credential_type.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// DepositPreauth
// ---------------------------------------------------------------------------

/// What a deposit preauthorization admits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreauthTarget {
    /// A single named account.
    Account(AccountId),
    /// Any account holding accepted credentials matching exactly this set.
    /// The ordered set is the canonical, duplicate-free storage order.
    Credentials(BTreeSet<CredentialSpec>),
}

/// A standing permission recorded by an account with deposit authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPreauth {
    pub owner: AccountId,
    pub target: PreauthTarget,
}

// ---------------------------------------------------------------------------
// Escrow
// ---------------------------------------------------------------------------

/// Native value held until a time and/or condition releases it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    pub source: AccountId,
    pub destination: AccountId,
    pub amount: Drops,
    /// Encoded PREIMAGE-SHA-256 condition.
    pub condition: Option<Vec<u8>>,
    pub finish_after: Option<LedgerTime>,
    pub cancel_after: Option<LedgerTime>,
    pub source_tag: Option<u32>,
    pub destination_tag: Option<u32>,
    /// Sequence of the transaction that created the escrow.
    pub sequence: u32,
}

impl Escrow {
    /// Finishing is allowed from `finish_after` up to, but not including,
    /// `cancel_after`.
    pub fn finish_window_open(&self, now: LedgerTime) -> bool {
        let started = self.finish_after.map_or(true, |t| now.has_reached(t));
        let closed = self.cancel_after.is_some_and(|t| now.has_reached(t));
        started && !closed
    }

    /// Cancelling needs a `cancel_after` that has been reached.
    pub fn cancellable(&self, now: LedgerTime) -> bool {
        self.cancel_after.is_some_and(|t| now.has_reached(t))
    }
}

// ---------------------------------------------------------------------------
// LedgerObject
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Account,
    Credential,
    DepositPreauth,
    Escrow,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => write!(f, "Account"),
            Self::Credential => write!(f, "Credential"),
            Self::DepositPreauth => write!(f, "DepositPreauth"),
            Self::Escrow => write!(f, "Escrow"),
        }
    }
}

/// Every object kind an owner directory can reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerObject {
    Credential(Credential),
    DepositPreauth(DepositPreauth),
    Escrow(Escrow),
}

impl LedgerObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Credential(_) => ObjectKind::Credential,
            Self::DepositPreauth(_) => ObjectKind::DepositPreauth,
            Self::Escrow(_) => ObjectKind::Escrow,
        }
    }

    /// The single account whose owner count includes this object.
    pub fn reserve_owner(&self) -> AccountId {
        match self {
            Self::Credential(c) => c.owner(),
            Self::DepositPreauth(p) => p.owner,
            Self::Escrow(e) => e.source,
        }
    }

    /// Every account whose owner directory references this object. The
    /// reserve owner is always first; duplicates are collapsed.
    pub fn directory_owners(&self) -> Vec<AccountId> {
        let (first, second) = match self {
            Self::Credential(c) => (c.owner(), Some(if c.accepted { c.issuer } else { c.subject })),
            Self::DepositPreauth(p) => (p.owner, None),
            Self::Escrow(e) => (e.source, Some(e.destination)),
        };
        match second {
            Some(other) if other != first => vec![first, other],
            _ => vec![first],
        }
    }

    /// Recompute the index from the object's identity fields.
    pub fn index(&self) -> ObjectIndex {
        match self {
            Self::Credential(c) => keylet::credential(&c.subject, &c.issuer, &c.credential_type),
            Self::DepositPreauth(p) => match &p.target {
                PreauthTarget::Account(authorized) => keylet::deposit_preauth(&p.owner, authorized),
                PreauthTarget::Credentials(specs) => {
                    keylet::deposit_preauth_credentials(&p.owner, specs)
                }
            },
            Self::Escrow(e) => keylet::escrow(&e.source, e.sequence),
        }
        .index
    }

    pub fn as_credential(&self) -> Option<&Credential> {
        match self {
            Self::Credential(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_deposit_preauth(&self) -> Option<&DepositPreauth> {
        match self {
            Self::DepositPreauth(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_escrow(&self) -> Option<&Escrow> {
        match self {
            Self::Escrow(e) => Some(e),
            _ => None,
        }
    }
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

    fn credential(accepted: bool) -> Credential {
        Credential {
            subject: bob(),
            issuer: alice(),
            credential_type: "kyc".into(),
            uri: None,
            expiration: Some(LedgerTime::from_secs(100)),
            accepted,
        }
    }

    fn escrow(finish_after: Option<u64>, cancel_after: Option<u64>) -> Escrow {
        Escrow {
            source: alice(),
            destination: bob(),
            amount: Drops::new(1_000),
            condition: None,
            finish_after: finish_after.map(LedgerTime::from_secs),
            cancel_after: cancel_after.map(LedgerTime::from_secs),
            source_tag: None,
            destination_tag: None,
            sequence: 7,
        }
    }

    #[test]
    fn credential_owner_follows_acceptance() {
        assert_eq!(credential(false).owner(), alice());
        assert_eq!(credential(true).owner(), bob());
    }

    #[test]
    fn credential_expiry_is_strict() {
        let c = credential(true);
        assert!(!c.is_expired(LedgerTime::from_secs(100)));
        assert!(c.is_expired(LedgerTime::from_secs(101)));
    }

    #[test]
    fn credential_without_expiration_never_expires() {
        let mut c = credential(true);
        c.expiration = None;
        assert!(!c.is_expired(LedgerTime::from_secs(u64::MAX)));
    }

    #[test]
    fn directory_owners_put_reserve_owner_first() {
        let pending = LedgerObject::Credential(credential(false));
        assert_eq!(pending.directory_owners(), vec![alice(), bob()]);
        let accepted = LedgerObject::Credential(credential(true));
        assert_eq!(accepted.directory_owners(), vec![bob(), alice()]);
    }

    #[test]
    fn self_issued_credential_has_one_directory() {
        let mut c = credential(true);
        c.subject = alice();
        assert_eq!(LedgerObject::Credential(c).directory_owners(), vec![alice()]);
    }

    #[test]
    fn escrow_reserve_owner_is_source() {
        let obj = LedgerObject::Escrow(escrow(Some(10), None));
        assert_eq!(obj.reserve_owner(), alice());
        assert_eq!(obj.directory_owners(), vec![alice(), bob()]);
    }

    #[test]
    fn escrow_finish_window() {
        let e = escrow(Some(10), Some(20));
        assert!(!e.finish_window_open(LedgerTime::from_secs(9)));
        assert!(e.finish_window_open(LedgerTime::from_secs(10)));
        assert!(e.finish_window_open(LedgerTime::from_secs(19)));
        assert!(!e.finish_window_open(LedgerTime::from_secs(20)));
    }

    #[test]
    fn escrow_without_cancel_after_is_never_cancellable() {
        assert!(!escrow(Some(10), None).cancellable(LedgerTime::from_secs(u64::MAX)));
        assert!(escrow(Some(10), Some(20)).cancellable(LedgerTime::from_secs(20)));
    }

    #[test]
    fn index_matches_keylet() {
        let c = credential(false);
        let obj = LedgerObject::Credential(c.clone());
        assert_eq!(
            obj.index(),
            keylet::credential(&c.subject, &c.issuer, &c.credential_type).index
        );
    }
}
