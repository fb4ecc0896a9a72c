//! DepositPreauth: grant or revoke a standing deposit permission.

use std::collections::BTreeSet;

use tally_ledger::objects::{DepositPreauth as PreauthEntry, LedgerObject, PreauthTarget};
use tally_ledger::{keylet, reserve, Keylet, ReadView, Sandbox};
use tally_types::limits::MAX_CREDENTIALS;
use tally_types::{AccountId, CredentialSpec, TxError, TxResult};

use super::{check_account_field, check_credential_type};
use crate::transactor::{ApplyContext, Transactor};
use crate::tx::DepositPreauth;

/// The single operation a `DepositPreauth` transaction requests.
enum Operation {
    Authorize(AccountId),
    Unauthorize(AccountId),
    AuthorizeCredentials(BTreeSet<CredentialSpec>),
    UnauthorizeCredentials(BTreeSet<CredentialSpec>),
}

impl DepositPreauth {
    fn operation(&self) -> TxResult<Operation> {
        match (
            &self.authorize,
            &self.unauthorize,
            &self.authorize_credentials,
            &self.unauthorize_credentials,
        ) {
            (Some(id), None, None, None) => Ok(Operation::Authorize(*id)),
            (None, Some(id), None, None) => Ok(Operation::Unauthorize(*id)),
            (None, None, Some(specs), None) => {
                Ok(Operation::AuthorizeCredentials(credential_set(specs)?))
            }
            (None, None, None, Some(specs)) => {
                Ok(Operation::UnauthorizeCredentials(credential_set(specs)?))
            }
            _ => Err(TxError::malformed(
                "exactly one of authorize, unauthorize, authorize_credentials, unauthorize_credentials",
            )),
        }
    }
}

impl Operation {
    fn keylet(&self, owner: &AccountId) -> Keylet {
        match self {
            Self::Authorize(id) | Self::Unauthorize(id) => keylet::deposit_preauth(owner, id),
            Self::AuthorizeCredentials(set) | Self::UnauthorizeCredentials(set) => {
                keylet::deposit_preauth_credentials(owner, set)
            }
        }
    }
}

/// Canonicalize a submitted credential list, rejecting bad shapes and
/// duplicates.
fn credential_set(specs: &[CredentialSpec]) -> TxResult<BTreeSet<CredentialSpec>> {
    if specs.is_empty() || specs.len() > MAX_CREDENTIALS {
        return Err(TxError::malformed(format!(
            "credential list of {} entries",
            specs.len()
        )));
    }
    for spec in specs {
        check_account_field(&spec.issuer)?;
        check_credential_type(&spec.credential_type)?;
    }
    let set: BTreeSet<_> = specs.iter().cloned().collect();
    if set.len() != specs.len() {
        return Err(TxError::malformed("duplicate credentials in list"));
    }
    Ok(set)
}

impl Transactor for DepositPreauth {
    fn preflight(&self, account: &AccountId) -> TxResult {
        match self.operation()? {
            Operation::Authorize(id) => {
                check_account_field(&id)?;
                if id == *account {
                    return Err(TxError::CannotPreauthSelf);
                }
                Ok(())
            }
            Operation::Unauthorize(id) => check_account_field(&id),
            Operation::AuthorizeCredentials(_) | Operation::UnauthorizeCredentials(_) => Ok(()),
        }
    }

    fn preclaim(&self, ctx: &ApplyContext<'_>, view: &dyn ReadView) -> TxResult {
        let operation = self.operation()?;
        let key = operation.keylet(&ctx.account);
        match &operation {
            Operation::Authorize(id) => {
                if !view.account_exists(id) {
                    return Err(TxError::NoTarget);
                }
            }
            Operation::AuthorizeCredentials(set) => {
                if set.iter().any(|spec| !view.account_exists(&spec.issuer)) {
                    return Err(TxError::NoIssuer);
                }
            }
            Operation::Unauthorize(_) | Operation::UnauthorizeCredentials(_) => {
                return if view.exists(&key.index) {
                    Ok(())
                } else {
                    Err(TxError::NoEntry)
                };
            }
        }
        if view.exists(&key.index) {
            return Err(TxError::Duplicate);
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult {
        let operation = self.operation()?;
        let key = operation.keylet(&ctx.account);
        let target = match operation {
            Operation::Authorize(id) => PreauthTarget::Account(id),
            Operation::AuthorizeCredentials(set) => PreauthTarget::Credentials(set),
            Operation::Unauthorize(_) | Operation::UnauthorizeCredentials(_) => {
                return reserve::remove_object(view, &key.index);
            }
        };
        let entry = LedgerObject::DepositPreauth(PreauthEntry {
            owner: ctx.account,
            target,
        });
        reserve::try_add_object(view, key.index, entry, ctx.prior_balance)
    }
}
