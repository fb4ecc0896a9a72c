use tally_types::AccountId;

/// Errors produced by ledger state operations outside transaction apply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("account {0} already exists")]
    AccountExists(AccountId),

    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
