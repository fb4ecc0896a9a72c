//! One module per transaction family.

pub mod account;
pub mod credential;
pub mod deposit_preauth;
pub mod escrow;
pub mod payment;

use std::collections::BTreeSet;

use tally_types::limits::MAX_CREDENTIALS;
use tally_types::{AccountId, CredentialType, ObjectIndex, TxError, TxResult};

use crate::transactor::Transactor;
use crate::tx::TxKind;

impl TxKind {
    pub(crate) fn transactor(&self) -> &dyn Transactor {
        match self {
            Self::CredentialCreate(t) => t,
            Self::CredentialAccept(t) => t,
            Self::CredentialDelete(t) => t,
            Self::DepositPreauth(t) => t,
            Self::EscrowCreate(t) => t,
            Self::EscrowFinish(t) => t,
            Self::EscrowCancel(t) => t,
            Self::Payment(t) => t,
            Self::AccountSet(t) => t,
            Self::AccountDelete(t) => t,
        }
    }
}

pub(crate) fn check_credential_type(credential_type: &CredentialType) -> TxResult {
    if !credential_type.is_well_formed() {
        return Err(TxError::malformed(format!(
            "credential type of {} bytes",
            credential_type.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_account_field(id: &AccountId) -> TxResult {
    if id.is_zero() {
        return Err(TxError::InvalidAccountId);
    }
    Ok(())
}

/// Shape of a presented credential id list: non-empty, bounded, distinct.
pub(crate) fn check_credential_ids(ids: Option<&[ObjectIndex]>) -> TxResult {
    let Some(ids) = ids else {
        return Ok(());
    };
    if ids.is_empty() || ids.len() > MAX_CREDENTIALS {
        return Err(TxError::malformed(format!(
            "{} credential ids presented",
            ids.len()
        )));
    }
    let distinct: BTreeSet<_> = ids.iter().collect();
    if distinct.len() != ids.len() {
        return Err(TxError::malformed("duplicate credential ids"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_id_lists_must_be_distinct_and_bounded() {
        let a = ObjectIndex::from_hash([1; 32]);
        let b = ObjectIndex::from_hash([2; 32]);
        assert!(check_credential_ids(None).is_ok());
        assert!(check_credential_ids(Some(&[a, b])).is_ok());
        assert!(check_credential_ids(Some(&[])).is_err());
        assert!(check_credential_ids(Some(&[a, a])).is_err());
        let many: Vec<_> = (0..=MAX_CREDENTIALS as u8)
            .map(|i| ObjectIndex::from_hash([i; 32]))
            .collect();
        assert!(check_credential_ids(Some(&many)).is_err());
    }

    #[test]
    fn zero_account_field_is_invalid() {
        assert_eq!(
            check_account_field(&AccountId::zero()),
            Err(TxError::InvalidAccountId)
        );
        assert!(check_account_field(&AccountId::from_seed("alice")).is_ok());
    }
}
