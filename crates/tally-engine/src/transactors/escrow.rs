//! EscrowCreate, EscrowFinish and EscrowCancel.

use tally_crypto::{condition, Condition};
use tally_gate::AuthorizationRequest;
use tally_ledger::objects::{Escrow, LedgerObject};
use tally_ledger::{keylet, reserve, ReadView, Sandbox};
use tally_types::{AccountId, ObjectIndex, TxError, TxResult};
use tracing::debug;

use super::{check_account_field, check_credential_ids};
use crate::transactor::{account_root, credit, debit, ApplyContext, Transactor};
use crate::tx::{EscrowCancel, EscrowCreate, EscrowFinish, EscrowLocator};

impl Transactor for EscrowCreate {
    fn preflight(&self, _account: &AccountId) -> TxResult {
        if !self.amount.is_positive() {
            return Err(TxError::BadAmount);
        }
        check_account_field(&self.destination)?;
        match (self.finish_after, self.cancel_after) {
            (None, None) => {
                return Err(TxError::BadExpiration(
                    "neither finish_after nor cancel_after".into(),
                ))
            }
            (Some(finish), Some(cancel)) if !cancel.is_after(finish) => {
                return Err(TxError::BadExpiration(
                    "cancel_after must follow finish_after".into(),
                ))
            }
            _ => {}
        }
        if self.finish_after.is_none() && self.condition.is_none() {
            return Err(TxError::malformed("neither finish_after nor condition"));
        }
        if let Some(bytes) = &self.condition {
            Condition::decode(bytes).map_err(|e| TxError::malformed(format!("condition: {e}")))?;
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult {
        let now = ctx.close_time;
        if self.cancel_after.is_some_and(|t| now.has_reached(t)) {
            return Err(TxError::NoPermission);
        }
        if self.finish_after.is_some_and(|t| now.is_after(t)) {
            return Err(TxError::NoPermission);
        }

        let destination = view.account(&self.destination).ok_or(TxError::NoTarget)?;
        if destination.flags.require_dest_tag && self.destination_tag.is_none() {
            return Err(TxError::DstTagNeeded);
        }
        if destination.flags.disallow_incoming_native && !destination.flags.deposit_auth {
            return Err(TxError::NoTarget);
        }

        let source = account_root(&*view, &ctx.account)?;
        let owner_count = source.owner_count.saturating_add(1);
        reserve::check_reserve(view.reserves(), ctx.prior_balance, owner_count)?;
        let needed = view
            .reserves()
            .required(owner_count)
            .checked_add(self.amount)
            .ok_or(TxError::Unfunded)?;
        if source.balance < needed {
            return Err(TxError::Unfunded);
        }

        debit(view, &ctx.account, self.amount)?;
        let key = keylet::escrow(&ctx.account, ctx.sequence);
        let escrow = Escrow {
            source: ctx.account,
            destination: self.destination,
            amount: self.amount,
            condition: self.condition.clone(),
            finish_after: self.finish_after,
            cancel_after: self.cancel_after,
            source_tag: self.source_tag,
            destination_tag: self.destination_tag,
            sequence: ctx.sequence,
        };
        reserve::insert_object(view, key.index, LedgerObject::Escrow(escrow))
    }
}

/// Find the escrow a finish or cancel refers to.
fn locate(view: &dyn ReadView, owner: &AccountId, locator: EscrowLocator) -> TxResult<(ObjectIndex, Escrow)> {
    let index = match locator {
        EscrowLocator::Sequence(seq) => keylet::escrow(owner, seq).index,
        EscrowLocator::Index(index) => index,
    };
    match view.escrow(&index) {
        Some(escrow) if escrow.source == *owner => Ok((index, escrow.clone())),
        _ => Err(TxError::NoTarget),
    }
}

impl EscrowFinish {
    /// Fulfillment rules at finish time. Any mismatch, including a decode
    /// failure, is a crypto-condition failure rather than a malformed
    /// transaction.
    fn check_condition(&self, stored: Option<&[u8]>) -> TxResult {
        match (stored, &self.condition, &self.fulfillment) {
            (None, None, None) => Ok(()),
            (Some(stored), Some(presented), Some(fulfillment)) if stored == presented.as_slice() => {
                match condition::validate(fulfillment, stored) {
                    Ok(true) => Ok(()),
                    Ok(false) | Err(_) => Err(TxError::CryptoConditionFailed),
                }
            }
            _ => Err(TxError::CryptoConditionFailed),
        }
    }
}

impl Transactor for EscrowFinish {
    fn preflight(&self, _account: &AccountId) -> TxResult {
        check_account_field(&self.owner)?;
        if self.condition.is_some() != self.fulfillment.is_some() {
            return Err(TxError::malformed(
                "condition and fulfillment must be given together",
            ));
        }
        check_credential_ids(self.credential_ids.as_deref())
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult {
        let (index, escrow) = locate(&*view, &self.owner, self.locator)?;
        if !escrow.finish_window_open(ctx.close_time) {
            return Err(TxError::NoPermission);
        }
        self.check_condition(escrow.condition.as_deref())?;

        let request = AuthorizationRequest {
            destination: escrow.destination,
            source: ctx.account,
            credential_ids: self.credential_ids.clone(),
        };
        ctx.authorize_delivery(&*view, &request)?;

        credit(view, &escrow.destination, escrow.amount)?;
        reserve::remove_object(view, &index)?;
        debug!(
            index = %index.short_hex(),
            destination = %escrow.destination,
            amount = %escrow.amount,
            "escrow finished"
        );
        Ok(())
    }
}

impl Transactor for EscrowCancel {
    fn preflight(&self, _account: &AccountId) -> TxResult {
        check_account_field(&self.owner)
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult {
        let (index, escrow) = locate(&*view, &self.owner, self.locator)?;
        if !escrow.cancellable(ctx.close_time) {
            return Err(TxError::NoPermission);
        }
        credit(view, &escrow.source, escrow.amount)?;
        reserve::remove_object(view, &index)?;
        debug!(index = %index.short_hex(), source = %escrow.source, "escrow cancelled");
        Ok(())
    }
}
