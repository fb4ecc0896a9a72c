use tally_gate::{AuthorizationRequest, DepositGate};
use tally_ledger::{AccountRoot, ApplyView, ReadView, Sandbox};
use tally_types::{AccountId, Drops, LedgerTime, ObjectIndex, TxError, TxResult};

/// Everything a transactor knows about the transaction being applied besides
/// its own fields.
pub struct ApplyContext<'g> {
    /// Submitting account.
    pub account: AccountId,
    pub sequence: u32,
    pub fee: Drops,
    pub close_time: LedgerTime,
    /// Submitter's balance before the fee was charged. Reserve checks for
    /// new objects measure against this.
    pub prior_balance: Drops,
    pub gate: &'g DepositGate,
    /// Credentials found expired while applying. Deleted even when the
    /// transaction fails.
    pub expired: Vec<ObjectIndex>,
}

impl ApplyContext<'_> {
    /// Consult the deposit gate, recording any expired credentials it found.
    pub fn authorize_delivery(
        &mut self,
        view: &dyn ReadView,
        request: &AuthorizationRequest,
    ) -> TxResult {
        let outcome = self.gate.authorize(view, request, self.close_time);
        self.expired.extend(outcome.expired);
        outcome.verdict
    }
}

/// The three phases every transaction type implements.
///
/// `preflight` sees only the transaction; `preclaim` also reads committed
/// state; `apply` mutates a sandbox that already has the fee charged and the
/// sequence consumed. A failure in any phase leaves the sandbox discarded.
pub trait Transactor {
    /// Checks independent of ledger state. Failures here are malformed-class.
    fn preflight(&self, account: &AccountId) -> TxResult;

    /// Read-only checks against the ledger before the fee is charged.
    fn preclaim(&self, _ctx: &ApplyContext<'_>, _view: &dyn ReadView) -> TxResult {
        Ok(())
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult;
}

// ---------------------------------------------------------------------------
// Balance helpers shared by transactors
// ---------------------------------------------------------------------------

pub(crate) fn account_root<V: ReadView + ?Sized>(view: &V, id: &AccountId) -> TxResult<AccountRoot> {
    view.account(id)
        .cloned()
        .ok_or_else(|| TxError::internal(format!("account {id} missing")))
}

pub(crate) fn credit<V: ApplyView + ?Sized>(view: &mut V, id: &AccountId, amount: Drops) -> TxResult {
    let mut root = account_root(&*view, id)?;
    root.balance = root
        .balance
        .checked_add(amount)
        .ok_or_else(|| TxError::internal(format!("balance of {id} overflows")))?;
    view.put_account(root);
    Ok(())
}

pub(crate) fn debit<V: ApplyView + ?Sized>(view: &mut V, id: &AccountId, amount: Drops) -> TxResult {
    let mut root = account_root(&*view, id)?;
    root.balance = root
        .balance
        .checked_sub(amount)
        .filter(|b| !b.is_negative())
        .ok_or_else(|| TxError::internal(format!("balance of {id} underflows")))?;
    view.put_account(root);
    Ok(())
}
