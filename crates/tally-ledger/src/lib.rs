//! Ledger state for the Tally ledger core.
//!
//! This crate holds everything the transaction engine mutates. It provides:
//! - The closed set of ledger object kinds and the account root
//! - Keylets: deterministic object addressing from identity fields
//! - `ReadView` / `ApplyView` trait boundaries
//! - `InMemoryLedger` state and the `Sandbox` that stages a transaction's
//!   mutations so they commit all-or-nothing
//! - Reserve and owner-directory accounting
//! - Credential lookup with explicit (non-mutating) expiry detection
//! - A whole-ledger invariant checker

pub mod config;
pub mod credentials;
pub mod error;
pub mod keylet;
pub mod memory;
pub mod objects;
pub mod reserve;
pub mod sandbox;
pub mod traits;
pub mod validation;

pub use config::{ConfigError, LedgerConfig};
pub use credentials::CredentialLookup;
pub use error::LedgerError;
pub use keylet::Keylet;
pub use memory::InMemoryLedger;
pub use objects::{
    AccountFlags, AccountRoot, Credential, DepositPreauth, Escrow, LedgerObject, ObjectKind,
    PreauthTarget,
};
pub use reserve::ReserveConfig;
pub use sandbox::{ChangeSet, EntryChange, Sandbox};
pub use traits::{ApplyView, ReadView};
pub use validation::{InvariantChecker, ValidationReport, Violation, ViolationKind};
