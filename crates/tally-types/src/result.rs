use std::fmt;

use serde::{Deserialize, Serialize};

/// How the surrounding pipeline treats a transaction result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultClass {
    /// Fee consumed, mutations committed.
    Success,
    /// Fee consumed, no object mutation (expired-credential cleanup aside).
    Claimed,
    /// Invalid independent of ledger state; no fee, no mutation.
    Malformed,
    /// Not applicable against the current ledger but may become so later
    /// (sequence gaps, fee not yet payable); no fee, no mutation.
    Retry,
    /// The ledger itself is inconsistent; no fee, no mutation.
    Failure,
}

impl fmt::Display for ResultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "tes"),
            Self::Claimed => write!(f, "tec"),
            Self::Malformed => write!(f, "tem"),
            Self::Retry => write!(f, "ter"),
            Self::Failure => write!(f, "tef"),
        }
    }
}

/// Every non-success transaction result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum TxError {
    // --- malformed class ---
    #[error("malformed transaction: {0}")]
    Malformed(String),

    #[error("amount must be positive")]
    BadAmount,

    #[error("invalid expiration: {0}")]
    BadExpiration(String),

    #[error("invalid account id")]
    InvalidAccountId,

    #[error("an account cannot preauthorize itself")]
    CannotPreauthSelf,

    #[error("transaction would have no effect")]
    Redundant,

    // --- claimed class ---
    #[error("object already exists")]
    Duplicate,

    #[error("no such ledger object")]
    NoEntry,

    #[error("target object or account does not exist")]
    NoTarget,

    #[error("issuer account does not exist")]
    NoIssuer,

    #[error("not permitted")]
    NoPermission,

    #[error("presented credentials are invalid")]
    BadCredentials,

    #[error("credential or object has expired")]
    Expired,

    #[error("insufficient reserve to own another object")]
    InsufficientReserve,

    #[error("insufficient balance beyond reserve")]
    Unfunded,

    #[error("crypto-condition fulfillment does not satisfy the condition")]
    CryptoConditionFailed,

    #[error("destination requires a destination tag")]
    DstTagNeeded,

    #[error("account still owns objects that cannot be removed")]
    HasObligations,

    // --- retry class ---
    #[error("submitting account does not exist")]
    NoAccount,

    #[error("sequence {got} already used; account is at {expected}")]
    PastSequence { expected: u32, got: u32 },

    #[error("sequence {got} is ahead of account sequence {expected}")]
    FutureSequence { expected: u32, got: u32 },

    #[error("balance cannot cover the fee")]
    InsufficientFee,

    // --- failure class ---
    #[error("ledger inconsistency: {0}")]
    Internal(String),
}

impl TxError {
    /// Shorthand for [`TxError::Malformed`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }

    /// Shorthand for [`TxError::Internal`].
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }

    /// Result class of this error.
    pub fn class(&self) -> ResultClass {
        match self {
            Self::Malformed(_)
            | Self::BadAmount
            | Self::BadExpiration(_)
            | Self::InvalidAccountId
            | Self::CannotPreauthSelf
            | Self::Redundant => ResultClass::Malformed,
            Self::Duplicate
            | Self::NoEntry
            | Self::NoTarget
            | Self::NoIssuer
            | Self::NoPermission
            | Self::BadCredentials
            | Self::Expired
            | Self::InsufficientReserve
            | Self::Unfunded
            | Self::CryptoConditionFailed
            | Self::DstTagNeeded
            | Self::HasObligations => ResultClass::Claimed,
            Self::NoAccount
            | Self::PastSequence { .. }
            | Self::FutureSequence { .. }
            | Self::InsufficientFee => ResultClass::Retry,
            Self::Internal(_) => ResultClass::Failure,
        }
    }

    /// Returns `true` if the fee is consumed despite the failure.
    pub fn claims_fee(&self) -> bool {
        self.class() == ResultClass::Claimed
    }
}

/// Result of a transaction or of one of its checks.
pub type TxResult<T = ()> = Result<T, TxError>;
