//! Foundation types for the Tally ledger core.
//!
//! This crate provides the identity, temporal, amount, and result types used
//! throughout Tally. Every other Tally crate depends on `tally-types`.
//!
//! # Key Types
//!
//! - [`AccountId`]: 20-byte account address derived from key material
//! - [`ObjectIndex`]: 32-byte deterministic storage index of a ledger object
//! - [`LedgerTime`]: ledger close time in whole seconds
//! - [`Drops`]: signed amount of the native currency in its smallest unit
//! - [`CredentialType`] / [`CredentialSpec`]: credential classification
//! - [`TxError`] / [`ResultClass`]: transaction result taxonomy

pub mod amount;
pub mod credential;
pub mod error;
pub mod identity;
pub mod limits;
pub mod object;
pub mod result;
pub mod temporal;

pub use amount::Drops;
pub use credential::{CredentialSpec, CredentialType};
pub use error::TypeError;
pub use identity::{AccountId, KeyMaterial};
pub use object::ObjectIndex;
pub use result::{ResultClass, TxError, TxResult};
pub use temporal::LedgerTime;
