//! Cryptographic primitives for the Tally ledger core.
//!
//! Provides domain-separated BLAKE3 hashing for ledger object indexes and a
//! strict codec for PREIMAGE-SHA-256 crypto-conditions and fulfillments.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod condition;
pub mod hasher;

pub use condition::{Condition, ConditionError, ConditionType, Fulfillment};
pub use hasher::IndexHasher;
