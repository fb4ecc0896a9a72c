//! Transaction engine for the Tally ledger core.
//!
//! The engine applies parsed, authenticated transactions to an
//! [`tally_ledger::InMemoryLedger`] one at a time. Each transaction type is a
//! [`Transactor`] with three phases (preflight, preclaim, apply); the engine
//! runs them against a sandbox and commits all of the transaction's effects
//! or none of them.
//!
//! # Quick Start
//!
//! ```rust
//! use tally_engine::{Engine, Payment, Transaction};
//! use tally_ledger::{InMemoryLedger, ReadView};
//! use tally_types::{AccountId, Drops, LedgerTime};
//!
//! let mut ledger = InMemoryLedger::default();
//! let alice = AccountId::from_seed("alice");
//! let bob = AccountId::from_seed("bob");
//! ledger.fund(alice, Drops::new(50_000_000)).unwrap();
//! ledger.fund(bob, Drops::new(50_000_000)).unwrap();
//!
//! let engine = Engine::new();
//! let tx = Transaction::new(alice, 1, Payment::new(bob, Drops::new(1_000)));
//! let outcome = engine.apply(&mut ledger, LedgerTime::from_secs(100), &tx);
//! assert!(outcome.is_success());
//! assert_eq!(ledger.account(&bob).unwrap().balance, Drops::new(50_001_000));
//! ```

pub mod engine;
pub mod transactor;
pub mod transactors;
pub mod tx;

pub use engine::{ApplyOutcome, Engine};
pub use transactor::{ApplyContext, Transactor};
pub use tx::{
    AccountDelete, AccountFlag, AccountSet, CredentialAccept, CredentialCreate, CredentialDelete,
    DepositPreauth, EscrowCancel, EscrowCreate, EscrowFinish, EscrowLocator, Payment, Transaction,
    TxKind,
};

#[cfg(test)]
pub(crate) mod testutil {
    use tally_crypto::Fulfillment;
    use tally_ledger::{keylet, InMemoryLedger, InvariantChecker, ReadView, ReserveConfig};
    use tally_types::{AccountId, Drops, LedgerTime, ObjectIndex};

    use crate::engine::{ApplyOutcome, Engine};
    use crate::tx::{Transaction, TxKind};

    pub const FEE: i64 = 10;
    pub const RESERVE_BASE: i64 = 1_000_000;
    pub const RESERVE_INC: i64 = 200_000;

    pub fn alice() -> AccountId {
        AccountId::from_seed("alice")
    }

    pub fn bob() -> AccountId {
        AccountId::from_seed("bob")
    }

    pub fn carol() -> AccountId {
        AccountId::from_seed("carol")
    }

    /// A fresh account id that no ledger has funded.
    pub fn unfunded() -> AccountId {
        AccountId::ephemeral()
    }

    pub fn credential_index(subject: AccountId, issuer: AccountId, kind: &str) -> ObjectIndex {
        keylet::credential(&subject, &issuer, &kind.into()).index
    }

    pub fn condition_for(preimage: &[u8]) -> Vec<u8> {
        Fulfillment::from_preimage(preimage.to_vec())
            .unwrap()
            .condition()
            .encode()
    }

    /// A ledger with alice, bob and carol funded, an engine, and a clock.
    /// Every submission is followed by a full invariant check.
    pub struct Harness {
        pub ledger: InMemoryLedger,
        pub engine: Engine,
        pub now: LedgerTime,
    }

    impl Harness {
        pub fn new() -> Self {
            let mut ledger = InMemoryLedger::with_reserves(ReserveConfig {
                base: Drops::new(RESERVE_BASE),
                increment: Drops::new(RESERVE_INC),
            });
            for id in [alice(), bob(), carol()] {
                ledger.fund(id, Drops::new(100_000_000)).unwrap();
            }
            Self {
                ledger,
                engine: Engine::new(),
                now: LedgerTime::from_secs(1_000_000),
            }
        }

        pub fn fund_exact(&mut self, seed: &str, balance: i64) -> AccountId {
            let id = AccountId::from_seed(seed);
            self.ledger.fund(id, Drops::new(balance)).unwrap();
            id
        }

        pub fn submit(&mut self, account: AccountId, kind: impl Into<TxKind>) -> ApplyOutcome {
            let sequence = self.ledger.account(&account).map_or(1, |root| root.sequence);
            let tx = Transaction::new(account, sequence, kind).with_fee(Drops::new(FEE));
            let outcome = self.engine.apply(&mut self.ledger, self.now, &tx);
            self.assert_invariants();
            outcome
        }

        /// Submit and require success.
        pub fn ok(&mut self, account: AccountId, kind: impl Into<TxKind>) -> ApplyOutcome {
            let kind = kind.into();
            let name = kind.name();
            let outcome = self.submit(account, kind);
            assert_eq!(outcome.result, Ok(()), "{name} from {account} failed");
            outcome
        }

        pub fn advance(&mut self, secs: u64) {
            self.now = self.now.plus_secs(secs);
        }

        pub fn balance(&self, id: AccountId) -> i64 {
            self.ledger.account(&id).unwrap().balance.get()
        }

        pub fn owner_count(&self, id: AccountId) -> u32 {
            self.ledger.account(&id).unwrap().owner_count
        }

        pub fn sequence(&self, id: AccountId) -> u32 {
            self.ledger.account(&id).unwrap().sequence
        }

        pub fn assert_invariants(&self) {
            let report = InvariantChecker::check(&self.ledger);
            assert!(report.is_valid(), "invariants violated: {:?}", report.violations);
        }
    }
}
