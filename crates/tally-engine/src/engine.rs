use tally_gate::DepositGate;
use tally_ledger::{credentials, ApplyView, ChangeSet, EntryChange, InMemoryLedger, ReadView, Sandbox};
use tally_types::{Drops, LedgerTime, ResultClass, TxError, TxResult};
use tracing::{debug, info, warn};

use crate::transactor::{account_root, ApplyContext};
use crate::tx::Transaction;

// ---------------------------------------------------------------------------
// ApplyOutcome
// ---------------------------------------------------------------------------

/// What applying one transaction did to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub result: TxResult,
    /// Fee taken from the submitter; zero unless the result claims it.
    pub fee_charged: Drops,
    /// Committed entry changes, empty when the ledger was left untouched.
    pub changes: Vec<EntryChange>,
}

impl ApplyOutcome {
    fn untouched(result: TxResult) -> Self {
        Self {
            result,
            fee_charged: Drops::ZERO,
            changes: Vec::new(),
        }
    }

    pub fn class(&self) -> ResultClass {
        match &self.result {
            Ok(()) => ResultClass::Success,
            Err(e) => e.class(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Applies transactions one at a time against an [`InMemoryLedger`].
///
/// Every transaction applies into a fresh sandbox. Success commits the
/// sandbox; a claimed-class failure discards it and commits only the fee,
/// the sequence bump, and the deletion of any expired credentials found;
/// every other failure leaves the ledger untouched.
pub struct Engine {
    gate: DepositGate,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_gate(DepositGate::with_default_stages())
    }

    pub fn with_gate(gate: DepositGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &DepositGate {
        &self.gate
    }

    /// Apply `tx` with the ledger's close time `close_time`.
    pub fn apply(
        &self,
        ledger: &mut InMemoryLedger,
        close_time: LedgerTime,
        tx: &Transaction,
    ) -> ApplyOutcome {
        let outcome = self.apply_inner(ledger, close_time, tx);
        match &outcome.result {
            Ok(()) => info!(
                account = %tx.account,
                seq = tx.sequence,
                kind = %tx.kind,
                changes = outcome.changes.len(),
                "transaction applied"
            ),
            Err(TxError::Internal(reason)) => warn!(
                account = %tx.account,
                seq = tx.sequence,
                kind = %tx.kind,
                %reason,
                "transaction hit a ledger inconsistency"
            ),
            Err(err) => info!(
                account = %tx.account,
                seq = tx.sequence,
                kind = %tx.kind,
                class = %err.class(),
                error = %err,
                "transaction failed"
            ),
        }
        outcome
    }

    fn apply_inner(
        &self,
        ledger: &mut InMemoryLedger,
        close_time: LedgerTime,
        tx: &Transaction,
    ) -> ApplyOutcome {
        let transactor = tx.kind.transactor();

        if let Err(e) = preflight(tx).and_then(|()| transactor.preflight(&tx.account)) {
            return ApplyOutcome::untouched(Err(e));
        }

        let prior_balance = match check_submitter(ledger, tx) {
            Ok(balance) => balance,
            Err(e) => return ApplyOutcome::untouched(Err(e)),
        };

        let mut ctx = ApplyContext {
            account: tx.account,
            sequence: tx.sequence,
            fee: tx.fee,
            close_time,
            prior_balance,
            gate: &self.gate,
            expired: Vec::new(),
        };

        let attempt = transactor.preclaim(&ctx, &*ledger).and_then(|()| {
            let mut sandbox = Sandbox::new(&*ledger);
            charge_fee(&mut sandbox, &ctx)?;
            transactor.apply(&mut ctx, &mut sandbox)?;
            Ok(sandbox.commit())
        });

        match attempt {
            Ok(changes) => commit(ledger, Ok(()), tx.fee, changes),
            Err(e) if e.claims_fee() => {
                debug!(error = %e, expired = ctx.expired.len(), "claiming fee only");
                let mut sandbox = Sandbox::new(&*ledger);
                let claimed = charge_fee(&mut sandbox, &ctx).and_then(|()| {
                    credentials::delete_expired(&mut sandbox, &ctx.expired, close_time)
                });
                match claimed {
                    Ok(()) => {
                        let changes = sandbox.commit();
                        commit(ledger, Err(e), tx.fee, changes)
                    }
                    Err(internal) => ApplyOutcome::untouched(Err(internal)),
                }
            }
            Err(e) => ApplyOutcome::untouched(Err(e)),
        }
    }
}

/// Checks on the transaction envelope itself.
fn preflight(tx: &Transaction) -> TxResult {
    if tx.fee.is_negative() {
        return Err(TxError::malformed("negative fee"));
    }
    if tx.account.is_zero() {
        return Err(TxError::InvalidAccountId);
    }
    Ok(())
}

/// Submitter existence, sequence, and fee. Returns the pre-fee balance.
fn check_submitter(ledger: &InMemoryLedger, tx: &Transaction) -> TxResult<Drops> {
    let root = ledger.account(&tx.account).ok_or(TxError::NoAccount)?;
    if tx.sequence < root.sequence {
        return Err(TxError::PastSequence {
            expected: root.sequence,
            got: tx.sequence,
        });
    }
    if tx.sequence > root.sequence {
        return Err(TxError::FutureSequence {
            expected: root.sequence,
            got: tx.sequence,
        });
    }
    if root.balance < tx.fee {
        return Err(TxError::InsufficientFee);
    }
    Ok(root.balance)
}

/// Take the fee and consume the sequence number.
fn charge_fee<V: ApplyView + ?Sized>(view: &mut V, ctx: &ApplyContext<'_>) -> TxResult {
    let mut root = account_root(&*view, &ctx.account)?;
    root.balance = root
        .balance
        .checked_sub(ctx.fee)
        .filter(|b| !b.is_negative())
        .ok_or(TxError::InsufficientFee)?;
    root.sequence = root
        .sequence
        .checked_add(1)
        .ok_or_else(|| TxError::internal("sequence exhausted"))?;
    view.put_account(root);
    Ok(())
}

fn commit(
    ledger: &mut InMemoryLedger,
    result: TxResult,
    fee: Drops,
    changes: ChangeSet,
) -> ApplyOutcome {
    let entries = changes.entries().to_vec();
    ledger.apply(changes);
    ApplyOutcome {
        result,
        fee_charged: fee,
        changes: entries,
    }
}

#[cfg(test)]
mod tests {
    use tally_ledger::{EntryChange, ReadView};
    use tally_types::{Drops, ResultClass, TxError};

    use super::*;
    use crate::testutil::*;
    use crate::tx::{Payment, Transaction};

    #[test]
    fn success_commits_and_lists_changes() {
        let mut h = Harness::new();
        let outcome = h.ok(alice(), Payment::new(bob(), Drops::new(1)));
        assert_eq!(outcome.fee_charged, Drops::new(FEE));
        assert_eq!(outcome.changes.len(), 2);
        assert!(outcome
            .changes
            .iter()
            .all(|c| matches!(c, EntryChange::AccountModified { .. })));
        assert_eq!(h.sequence(alice()), 2);
    }

    #[test]
    fn sequence_must_match() {
        let mut h = Harness::new();
        let engine = Engine::new();
        let now = h.now;
        for (seq, expected) in [
            (0, TxError::PastSequence { expected: 1, got: 0 }),
            (2, TxError::FutureSequence { expected: 1, got: 2 }),
        ] {
            let tx = Transaction::new(alice(), seq, Payment::new(bob(), Drops::new(1)));
            let outcome = engine.apply(&mut h.ledger, now, &tx);
            assert_eq!(outcome.result, Err(expected));
            assert_eq!(outcome.class(), ResultClass::Retry);
            assert!(outcome.changes.is_empty());
        }
        assert_eq!(h.sequence(alice()), 1);
    }

    #[test]
    fn unknown_submitter_and_unpayable_fee_are_retry() {
        let mut h = Harness::new();
        let engine = Engine::new();
        let now = h.now;
        let ghost = unfunded();
        let tx = Transaction::new(ghost, 1, Payment::new(bob(), Drops::new(1)));
        assert_eq!(engine.apply(&mut h.ledger, now, &tx).result, Err(TxError::NoAccount));

        let broke = h.fund_exact("broke", 5);
        let tx = Transaction::new(broke, 1, Payment::new(bob(), Drops::new(1)));
        assert_eq!(
            engine.apply(&mut h.ledger, now, &tx).result,
            Err(TxError::InsufficientFee)
        );
        assert_eq!(h.balance(broke), 5);
    }

    #[test]
    fn malformed_leaves_ledger_untouched() {
        let mut h = Harness::new();
        let before = h.balance(alice());
        let outcome = h.submit(alice(), Payment::new(bob(), Drops::new(-1)));
        assert_eq!(outcome.class(), ResultClass::Malformed);
        assert_eq!(outcome.fee_charged, Drops::ZERO);
        assert!(outcome.changes.is_empty());
        assert_eq!(h.balance(alice()), before);
        assert_eq!(h.sequence(alice()), 1);
    }

    #[test]
    fn claimed_failure_charges_fee_and_bumps_sequence_only() {
        let mut h = Harness::new();
        let before = h.balance(alice());
        let outcome = h.submit(alice(), Payment::new(unfunded(), Drops::new(1)));
        assert_eq!(outcome.result, Err(TxError::NoTarget));
        assert_eq!(outcome.fee_charged, Drops::new(FEE));
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(h.balance(alice()), before - FEE);
        assert_eq!(h.sequence(alice()), 2);
    }

    #[test]
    fn negative_fee_is_malformed() {
        let mut h = Harness::new();
        let engine = Engine::default();
        let now = h.now;
        let tx = Transaction::new(alice(), 1, Payment::new(bob(), Drops::new(1)))
            .with_fee(Drops::new(-1));
        assert_eq!(
            engine.apply(&mut h.ledger, now, &tx).class(),
            ResultClass::Malformed
        );
    }
}
