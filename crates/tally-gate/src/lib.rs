//! Deposit-authorization gate for the Tally ledger core.
//!
//! Whenever value is about to move from one account to another (a payment,
//! an escrow finish, an account deletion's remaining balance), the gate
//! decides whether the destination permits it. The gate runs a pipeline of
//! stages and produces a verdict together with the presented credentials
//! found expired, which the caller must delete.
//!
//! # Quick Start
//!
//! ```rust
//! use tally_gate::{AuthorizationRequest, DepositGate};
//! use tally_ledger::InMemoryLedger;
//! use tally_types::{AccountId, Drops, LedgerTime};
//!
//! let mut ledger = InMemoryLedger::default();
//! let alice = AccountId::from_seed("alice");
//! let bob = AccountId::from_seed("bob");
//! ledger.fund(alice, Drops::new(10_000_000)).unwrap();
//! ledger.fund(bob, Drops::new(10_000_000)).unwrap();
//!
//! let gate = DepositGate::with_default_stages();
//! let outcome = gate.authorize(&ledger, &AuthorizationRequest::new(alice, bob), LedgerTime::from_secs(0));
//! assert!(outcome.is_authorized());
//! ```

pub mod gate;
pub mod stage;
pub mod stages;

pub use gate::{DepositGate, GateOutcome};
pub use stage::{AuthorizationRequest, GateContext, GateStage, StageDecision, StageResult};
pub use stages::{
    CredentialPreauthStage, DepositAuthFlagStage, DirectPreauthStage, PresentedCredentialsStage,
    SelfDeliveryStage,
};

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::BTreeSet;

    use tally_ledger::objects::{Credential, DepositPreauth, LedgerObject, PreauthTarget};
    use tally_ledger::{reserve, InMemoryLedger, ReadView, Sandbox};
    use tally_types::{AccountId, CredentialSpec, Drops, LedgerTime, ObjectIndex};

    pub fn alice() -> AccountId {
        AccountId::from_seed("alice")
    }

    pub fn bob() -> AccountId {
        AccountId::from_seed("bob")
    }

    pub fn carol() -> AccountId {
        AccountId::from_seed("carol")
    }

    pub fn now() -> LedgerTime {
        LedgerTime::from_secs(1_000)
    }

    /// A ledger with alice, bob and carol funded.
    pub struct Fixture {
        pub ledger: InMemoryLedger,
    }

    impl Fixture {
        pub fn new() -> Self {
            let mut ledger = InMemoryLedger::default();
            for id in [alice(), bob(), carol()] {
                ledger.fund(id, Drops::new(100_000_000)).unwrap();
            }
            Self { ledger }
        }

        pub fn require_auth(&mut self, id: AccountId) {
            let mut root = self.ledger.account(&id).unwrap().clone();
            root.flags.deposit_auth = true;
            self.ledger.update_account(root).unwrap();
        }

        pub fn insert(&mut self, object: LedgerObject) -> ObjectIndex {
            let index = object.index();
            let mut sandbox = Sandbox::new(&self.ledger);
            reserve::insert_object(&mut sandbox, index, object).unwrap();
            let changes = sandbox.commit();
            self.ledger.apply(changes);
            index
        }

        pub fn preauth_account(&mut self, owner: AccountId, authorized: AccountId) -> ObjectIndex {
            self.insert(LedgerObject::DepositPreauth(DepositPreauth {
                owner,
                target: PreauthTarget::Account(authorized),
            }))
        }

        pub fn preauth_credentials(
            &mut self,
            owner: AccountId,
            specs: impl IntoIterator<Item = CredentialSpec>,
        ) -> ObjectIndex {
            let set: BTreeSet<_> = specs.into_iter().collect();
            self.insert(LedgerObject::DepositPreauth(DepositPreauth {
                owner,
                target: PreauthTarget::Credentials(set),
            }))
        }

        pub fn credential(
            &mut self,
            subject: AccountId,
            issuer: AccountId,
            kind: &str,
            accepted: bool,
            expiration: Option<LedgerTime>,
        ) -> ObjectIndex {
            self.insert(LedgerObject::Credential(Credential {
                subject,
                issuer,
                credential_type: kind.into(),
                uri: None,
                expiration,
                accepted,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use tally_types::{CredentialSpec, LedgerTime, ObjectIndex, TxError};

    fn authorize(fx: &Fixture, request: AuthorizationRequest) -> GateOutcome {
        DepositGate::with_default_stages().authorize(&fx.ledger, &request, now())
    }

    // -----------------------------------------------------------------------
    // 1. Destinations without deposit authorization accept anyone
    // -----------------------------------------------------------------------

    #[test]
    fn open_destination_authorizes() {
        let fx = Fixture::new();
        assert!(authorize(&fx, AuthorizationRequest::new(alice(), bob())).is_authorized());
    }

    #[test]
    fn missing_destination_authorizes() {
        let fx = Fixture::new();
        let stranger = tally_types::AccountId::ephemeral();
        assert!(authorize(&fx, AuthorizationRequest::new(alice(), stranger)).is_authorized());
    }

    // -----------------------------------------------------------------------
    // 2. Deposit authorization
    // -----------------------------------------------------------------------

    #[test]
    fn self_delivery_is_always_authorized() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        assert!(authorize(&fx, AuthorizationRequest::new(bob(), bob())).is_authorized());
    }

    #[test]
    fn unauthorized_source_is_denied() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        assert_eq!(
            authorize(&fx, AuthorizationRequest::new(alice(), bob())).verdict,
            Err(TxError::NoPermission)
        );
    }

    #[test]
    fn direct_preauth_authorizes() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        fx.preauth_account(bob(), alice());
        assert!(authorize(&fx, AuthorizationRequest::new(alice(), bob())).is_authorized());
    }

    #[test]
    fn preauth_is_directional() {
        let mut fx = Fixture::new();
        fx.require_auth(alice());
        fx.preauth_account(bob(), alice());
        assert_eq!(
            authorize(&fx, AuthorizationRequest::new(bob(), alice())).verdict,
            Err(TxError::NoPermission)
        );
    }

    // -----------------------------------------------------------------------
    // 3. Credential-based preauthorization
    // -----------------------------------------------------------------------

    #[test]
    fn matching_credential_set_authorizes() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        fx.preauth_credentials(bob(), [CredentialSpec::new(carol(), "kyc")]);
        let id = fx.credential(alice(), carol(), "kyc", true, None);
        let outcome = authorize(
            &fx,
            AuthorizationRequest::new(alice(), bob()).with_credentials(vec![id]),
        );
        assert!(outcome.is_authorized());
        assert_eq!(
            outcome.stage_results.last().unwrap().stage_name,
            "credential-preauth"
        );
    }

    #[test]
    fn superset_of_preauthorized_set_is_denied() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        fx.preauth_credentials(bob(), [CredentialSpec::new(carol(), "kyc")]);
        let kyc = fx.credential(alice(), carol(), "kyc", true, None);
        let aml = fx.credential(alice(), carol(), "aml", true, None);
        assert_eq!(
            authorize(
                &fx,
                AuthorizationRequest::new(alice(), bob()).with_credentials(vec![kyc, aml]),
            )
            .verdict,
            Err(TxError::NoPermission)
        );
    }

    #[test]
    fn presentation_order_does_not_matter() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        fx.preauth_credentials(
            bob(),
            [
                CredentialSpec::new(carol(), "aml"),
                CredentialSpec::new(carol(), "kyc"),
            ],
        );
        let kyc = fx.credential(alice(), carol(), "kyc", true, None);
        let aml = fx.credential(alice(), carol(), "aml", true, None);
        for ids in [vec![kyc, aml], vec![aml, kyc]] {
            let request = AuthorizationRequest::new(alice(), bob()).with_credentials(ids);
            assert!(authorize(&fx, request).is_authorized());
        }
    }

    #[test]
    fn direct_preauth_wins_over_unmatched_credentials() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        fx.preauth_account(bob(), alice());
        let id = fx.credential(alice(), carol(), "kyc", true, None);
        let request = AuthorizationRequest::new(alice(), bob()).with_credentials(vec![id]);
        assert!(authorize(&fx, request).is_authorized());
    }

    // -----------------------------------------------------------------------
    // 4. Presented credential validation
    // -----------------------------------------------------------------------

    #[test]
    fn unaccepted_credential_is_bad_even_without_deposit_auth() {
        let mut fx = Fixture::new();
        let id = fx.credential(alice(), carol(), "kyc", false, None);
        let request = AuthorizationRequest::new(alice(), bob()).with_credentials(vec![id]);
        assert_eq!(authorize(&fx, request).verdict, Err(TxError::BadCredentials));
    }

    #[test]
    fn credential_of_another_subject_is_bad() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        let id = fx.credential(carol(), carol(), "kyc", true, None);
        let request = AuthorizationRequest::new(alice(), bob()).with_credentials(vec![id]);
        assert_eq!(authorize(&fx, request).verdict, Err(TxError::BadCredentials));
    }

    #[test]
    fn unknown_credential_is_bad() {
        let fx = Fixture::new();
        let request = AuthorizationRequest::new(alice(), bob())
            .with_credentials(vec![ObjectIndex::from_hash([5; 32])]);
        assert_eq!(authorize(&fx, request).verdict, Err(TxError::BadCredentials));
    }

    #[test]
    fn duplicate_or_empty_ids_are_malformed() {
        let mut fx = Fixture::new();
        let id = fx.credential(alice(), carol(), "kyc", true, None);
        for ids in [vec![], vec![id, id]] {
            let request = AuthorizationRequest::new(alice(), bob()).with_credentials(ids);
            assert!(matches!(
                authorize(&fx, request).verdict,
                Err(TxError::Malformed(_))
            ));
        }
    }

    #[test]
    fn expired_credential_reports_indexes_without_deleting() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        fx.preauth_credentials(bob(), [CredentialSpec::new(carol(), "kyc")]);
        let id = fx.credential(alice(), carol(), "kyc", true, Some(LedgerTime::from_secs(10)));
        let request = AuthorizationRequest::new(alice(), bob()).with_credentials(vec![id]);

        let outcome = authorize(&fx, request);
        assert_eq!(outcome.verdict, Err(TxError::Expired));
        assert_eq!(outcome.expired, vec![id]);
        assert!(tally_ledger::ReadView::exists(&fx.ledger, &id));
    }

    #[test]
    fn bad_credential_takes_precedence_over_expiry() {
        let mut fx = Fixture::new();
        let expired = fx.credential(alice(), carol(), "kyc", true, Some(LedgerTime::from_secs(10)));
        let pending = fx.credential(alice(), carol(), "aml", false, None);
        let request =
            AuthorizationRequest::new(alice(), bob()).with_credentials(vec![expired, pending]);
        let outcome = authorize(&fx, request);
        assert_eq!(outcome.verdict, Err(TxError::BadCredentials));
        assert!(outcome.expired.is_empty());
    }

    // -----------------------------------------------------------------------
    // 5. Credential set matching
    // -----------------------------------------------------------------------

    const KINDS: [&str; 4] = ["kyc", "aml", "accredited", "resident"];

    fn pick(mask: u8) -> Vec<&'static str> {
        KINDS
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, kind)| *kind)
            .collect()
    }

    proptest::proptest! {
        #[test]
        fn credentials_authorize_only_the_exact_preauthorized_set(
            accepted in 1u8..16,
            presented in 1u8..16,
            reverse in proptest::bool::ANY,
        ) {
            let mut fx = Fixture::new();
            fx.require_auth(bob());
            fx.preauth_credentials(
                bob(),
                pick(accepted).into_iter().map(|kind| CredentialSpec::new(carol(), kind)),
            );
            let mut ids: Vec<ObjectIndex> = pick(presented)
                .into_iter()
                .map(|kind| fx.credential(alice(), carol(), kind, true, None))
                .collect();
            if reverse {
                ids.reverse();
            }
            let outcome = authorize(&fx, AuthorizationRequest::new(alice(), bob()).with_credentials(ids));
            proptest::prop_assert_eq!(outcome.is_authorized(), accepted == presented);
        }
    }
}
