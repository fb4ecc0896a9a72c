use std::fmt;

use serde::{Deserialize, Serialize};
use tally_types::{AccountId, CredentialSpec, CredentialType, Drops, LedgerTime, ObjectIndex};

/// A parsed, already-authenticated transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Submitting account.
    pub account: AccountId,
    pub fee: Drops,
    /// Must equal the submitting account's current sequence.
    pub sequence: u32,
    pub kind: TxKind,
}

impl Transaction {
    pub fn new(account: AccountId, sequence: u32, kind: impl Into<TxKind>) -> Self {
        Self {
            account,
            fee: Drops::new(10),
            sequence,
            kind: kind.into(),
        }
    }

    pub fn with_fee(mut self, fee: Drops) -> Self {
        self.fee = fee;
        self
    }
}

/// Every supported transaction type with its fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TxKind {
    CredentialCreate(CredentialCreate),
    CredentialAccept(CredentialAccept),
    CredentialDelete(CredentialDelete),
    DepositPreauth(DepositPreauth),
    EscrowCreate(EscrowCreate),
    EscrowFinish(EscrowFinish),
    EscrowCancel(EscrowCancel),
    Payment(Payment),
    AccountSet(AccountSet),
    AccountDelete(AccountDelete),
}

impl TxKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CredentialCreate(_) => "CredentialCreate",
            Self::CredentialAccept(_) => "CredentialAccept",
            Self::CredentialDelete(_) => "CredentialDelete",
            Self::DepositPreauth(_) => "DepositPreauth",
            Self::EscrowCreate(_) => "EscrowCreate",
            Self::EscrowFinish(_) => "EscrowFinish",
            Self::EscrowCancel(_) => "EscrowCancel",
            Self::Payment(_) => "Payment",
            Self::AccountSet(_) => "AccountSet",
            Self::AccountDelete(_) => "AccountDelete",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! into_kind {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for TxKind {
                fn from(fields: $ty) -> Self {
                    Self::$ty(fields)
                }
            }
        )*
    };
}

into_kind!(
    CredentialCreate,
    CredentialAccept,
    CredentialDelete,
    DepositPreauth,
    EscrowCreate,
    EscrowFinish,
    EscrowCancel,
    Payment,
    AccountSet,
    AccountDelete,
);

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Issue a credential to `subject`. The submitter is the issuer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCreate {
    pub subject: AccountId,
    pub credential_type: CredentialType,
    #[serde(default)]
    pub uri: Option<Vec<u8>>,
    #[serde(default)]
    pub expiration: Option<LedgerTime>,
}

/// Accept a pending credential. The submitter is the subject.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialAccept {
    pub issuer: AccountId,
    pub credential_type: CredentialType,
}

/// Delete a credential. Omitted parties default to the submitter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDelete {
    #[serde(default)]
    pub subject: Option<AccountId>,
    #[serde(default)]
    pub issuer: Option<AccountId>,
    pub credential_type: CredentialType,
}

// ---------------------------------------------------------------------------
// Deposit preauthorization
// ---------------------------------------------------------------------------

/// Grant or revoke a preauthorization. Exactly one field must be set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPreauth {
    #[serde(default)]
    pub authorize: Option<AccountId>,
    #[serde(default)]
    pub unauthorize: Option<AccountId>,
    #[serde(default)]
    pub authorize_credentials: Option<Vec<CredentialSpec>>,
    #[serde(default)]
    pub unauthorize_credentials: Option<Vec<CredentialSpec>>,
}

impl DepositPreauth {
    pub fn authorize(account: AccountId) -> Self {
        Self {
            authorize: Some(account),
            ..Self::default()
        }
    }

    pub fn unauthorize(account: AccountId) -> Self {
        Self {
            unauthorize: Some(account),
            ..Self::default()
        }
    }

    pub fn authorize_credentials(specs: Vec<CredentialSpec>) -> Self {
        Self {
            authorize_credentials: Some(specs),
            ..Self::default()
        }
    }

    pub fn unauthorize_credentials(specs: Vec<CredentialSpec>) -> Self {
        Self {
            unauthorize_credentials: Some(specs),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Escrow
// ---------------------------------------------------------------------------

/// Lock native value until a time and/or a condition releases it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCreate {
    pub destination: AccountId,
    pub amount: Drops,
    #[serde(default)]
    pub condition: Option<Vec<u8>>,
    #[serde(default)]
    pub finish_after: Option<LedgerTime>,
    #[serde(default)]
    pub cancel_after: Option<LedgerTime>,
    #[serde(default)]
    pub source_tag: Option<u32>,
    #[serde(default)]
    pub destination_tag: Option<u32>,
}

impl EscrowCreate {
    pub fn new(destination: AccountId, amount: Drops) -> Self {
        Self {
            destination,
            amount,
            condition: None,
            finish_after: None,
            cancel_after: None,
            source_tag: None,
            destination_tag: None,
        }
    }
}

/// How a finish or cancel names its escrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowLocator {
    /// Sequence of the transaction that created it.
    Sequence(u32),
    /// The escrow's object index.
    Index(ObjectIndex),
}

/// Release an escrow to its destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowFinish {
    /// Source account of the escrow.
    pub owner: AccountId,
    pub locator: EscrowLocator,
    #[serde(default)]
    pub condition: Option<Vec<u8>>,
    #[serde(default)]
    pub fulfillment: Option<Vec<u8>>,
    #[serde(default)]
    pub credential_ids: Option<Vec<ObjectIndex>>,
}

impl EscrowFinish {
    pub fn new(owner: AccountId, locator: EscrowLocator) -> Self {
        Self {
            owner,
            locator,
            condition: None,
            fulfillment: None,
            credential_ids: None,
        }
    }
}

/// Return an expired escrow to its source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCancel {
    pub owner: AccountId,
    pub locator: EscrowLocator,
}

// ---------------------------------------------------------------------------
// Payment and account management
// ---------------------------------------------------------------------------

/// Direct native transfer to an existing account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub destination: AccountId,
    pub amount: Drops,
    #[serde(default)]
    pub destination_tag: Option<u32>,
    #[serde(default)]
    pub credential_ids: Option<Vec<ObjectIndex>>,
}

impl Payment {
    pub fn new(destination: AccountId, amount: Drops) -> Self {
        Self {
            destination,
            amount,
            destination_tag: None,
            credential_ids: None,
        }
    }
}

/// A settable account flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountFlag {
    DepositAuth,
    DisallowIncomingNative,
    RequireDestTag,
}

/// Set and/or clear one account flag each.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSet {
    #[serde(default)]
    pub set: Option<AccountFlag>,
    #[serde(default)]
    pub clear: Option<AccountFlag>,
}

impl AccountSet {
    pub fn set(flag: AccountFlag) -> Self {
        Self {
            set: Some(flag),
            clear: None,
        }
    }

    pub fn clear(flag: AccountFlag) -> Self {
        Self {
            set: None,
            clear: Some(flag),
        }
    }
}

/// Remove the submitting account, sending its balance to `destination`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDelete {
    pub destination: AccountId,
    #[serde(default)]
    pub destination_tag: Option<u32>,
    #[serde(default)]
    pub credential_ids: Option<Vec<ObjectIndex>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_variants() {
        let kind: TxKind = Payment::new(AccountId::from_seed("bob"), Drops::new(1)).into();
        assert_eq!(kind.name(), "Payment");
        assert_eq!(kind.to_string(), "Payment");
    }

    #[test]
    fn transaction_json_is_tagged_by_type() {
        let tx = Transaction::new(
            AccountId::from_seed("alice"),
            1,
            DepositPreauth::authorize(AccountId::from_seed("bob")),
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["kind"]["type"], "DepositPreauth");
        assert!(json["kind"]["unauthorize"].is_null());
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn omitted_optional_fields_default_to_none() {
        let subject = serde_json::to_value(AccountId::from_seed("bob")).unwrap();
        let json = serde_json::json!({
            "type": "CredentialCreate",
            "subject": subject,
            "credential_type": [107, 121, 99],
        });
        let kind: TxKind = serde_json::from_value(json).unwrap();
        match kind {
            TxKind::CredentialCreate(c) => {
                assert_eq!(c.credential_type, CredentialType::from("kyc"));
                assert!(c.uri.is_none());
                assert!(c.expiration.is_none());
            }
            other => panic!("unexpected kind {other}"),
        }
    }
}
