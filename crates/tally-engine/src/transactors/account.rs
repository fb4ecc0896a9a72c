//! AccountSet and AccountDelete.

use tally_gate::AuthorizationRequest;
use tally_ledger::objects::LedgerObject;
use tally_ledger::{reserve, AccountFlags, ApplyView, ReadView, Sandbox};
use tally_types::{AccountId, TxError, TxResult};
use tracing::debug;

use super::{check_account_field, check_credential_ids};
use crate::transactor::{account_root, credit, ApplyContext, Transactor};
use crate::tx::{AccountDelete, AccountFlag, AccountSet};

fn flag_mut(flags: &mut AccountFlags, flag: AccountFlag) -> &mut bool {
    match flag {
        AccountFlag::DepositAuth => &mut flags.deposit_auth,
        AccountFlag::DisallowIncomingNative => &mut flags.disallow_incoming_native,
        AccountFlag::RequireDestTag => &mut flags.require_dest_tag,
    }
}

impl Transactor for AccountSet {
    fn preflight(&self, _account: &AccountId) -> TxResult {
        if self.set.is_some() && self.set == self.clear {
            return Err(TxError::malformed("flag both set and cleared"));
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult {
        let mut root = account_root(&*view, &ctx.account)?;
        if let Some(flag) = self.set {
            *flag_mut(&mut root.flags, flag) = true;
        }
        if let Some(flag) = self.clear {
            *flag_mut(&mut root.flags, flag) = false;
        }
        debug!(account = %ctx.account, flags = ?root.flags, "account flags updated");
        view.put_account(root);
        Ok(())
    }
}

/// Objects an account may own and still be deleted. They are removed with it.
fn deletable(object: &LedgerObject) -> bool {
    match object {
        LedgerObject::Credential(_) | LedgerObject::DepositPreauth(_) => true,
        LedgerObject::Escrow(_) => false,
    }
}

impl Transactor for AccountDelete {
    fn preflight(&self, account: &AccountId) -> TxResult {
        check_account_field(&self.destination)?;
        if self.destination == *account {
            return Err(TxError::Redundant);
        }
        check_credential_ids(self.credential_ids.as_deref())
    }

    fn preclaim(&self, ctx: &ApplyContext<'_>, view: &dyn ReadView) -> TxResult {
        let destination = view.account(&self.destination).ok_or(TxError::NoTarget)?;
        if destination.flags.require_dest_tag && self.destination_tag.is_none() {
            return Err(TxError::DstTagNeeded);
        }
        let obligated = view
            .owner_entries(&ctx.account)
            .iter()
            .filter_map(|index| view.object(index))
            .any(|object| !deletable(object));
        if obligated {
            return Err(TxError::HasObligations);
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult {
        let request = AuthorizationRequest {
            destination: self.destination,
            source: ctx.account,
            credential_ids: self.credential_ids.clone(),
        };
        ctx.authorize_delivery(&*view, &request)?;

        for index in view.owner_entries(&ctx.account) {
            reserve::remove_object(view, &index)?;
        }

        let root = account_root(&*view, &ctx.account)?;
        if root.owner_count != 0 {
            return Err(TxError::internal(format!(
                "{} still owns {} objects after cascade",
                ctx.account, root.owner_count
            )));
        }
        credit(view, &self.destination, root.balance)?;
        view.erase_account(&ctx.account);
        debug!(
            account = %ctx.account,
            destination = %self.destination,
            balance = %root.balance,
            "account deleted"
        );
        Ok(())
    }
}
