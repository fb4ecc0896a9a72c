//! Payment: direct native transfer between existing accounts.

use tally_gate::AuthorizationRequest;
use tally_ledger::{ReadView, Sandbox};
use tally_types::{AccountId, TxError, TxResult};

use super::{check_account_field, check_credential_ids};
use crate::transactor::{account_root, credit, debit, ApplyContext, Transactor};
use crate::tx::Payment;

impl Transactor for Payment {
    fn preflight(&self, account: &AccountId) -> TxResult {
        if !self.amount.is_positive() {
            return Err(TxError::BadAmount);
        }
        check_account_field(&self.destination)?;
        if self.destination == *account {
            return Err(TxError::Redundant);
        }
        check_credential_ids(self.credential_ids.as_deref())
    }

    fn preclaim(&self, _ctx: &ApplyContext<'_>, view: &dyn ReadView) -> TxResult {
        let destination = view.account(&self.destination).ok_or(TxError::NoTarget)?;
        if destination.flags.require_dest_tag && self.destination_tag.is_none() {
            return Err(TxError::DstTagNeeded);
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

        let source = account_root(&*view, &ctx.account)?;
        let needed = view
            .reserves()
            .required(source.owner_count)
            .checked_add(self.amount)
            .ok_or(TxError::Unfunded)?;
        if source.balance < needed {
            return Err(TxError::Unfunded);
        }

        debit(view, &ctx.account, self.amount)?;
        credit(view, &self.destination, self.amount)
    }
}
