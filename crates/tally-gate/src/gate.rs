use tally_ledger::ReadView;
use tally_types::{LedgerTime, ObjectIndex, TxError, TxResult};
use tracing::debug;

use crate::stage::{AuthorizationRequest, GateContext, GateStage, StageDecision, StageResult};
use crate::stages::{
    CredentialPreauthStage, DepositAuthFlagStage, DirectPreauthStage, PresentedCredentialsStage,
    SelfDeliveryStage,
};

// ---------------------------------------------------------------------------
// GateOutcome
// ---------------------------------------------------------------------------

/// The outcome of running a request through the full gate pipeline.
#[derive(Clone, Debug)]
pub struct GateOutcome {
    /// `Ok(())` when delivery is authorized.
    pub verdict: TxResult,
    /// Presented credentials found expired. Non-empty only with an
    /// `Expired` verdict; the caller deletes them even though the
    /// transaction fails.
    pub expired: Vec<ObjectIndex>,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
}

impl GateOutcome {
    pub fn is_authorized(&self) -> bool {
        self.verdict.is_ok()
    }
}

// ---------------------------------------------------------------------------
// DepositGate
// ---------------------------------------------------------------------------

/// The deposit-authorization gate: a pipeline of stages deciding whether a
/// source may deliver value to a destination.
///
/// Payments, escrow finishes and account deletions all consult the same
/// gate. The gate only reads the ledger.
pub struct DepositGate {
    stages: Vec<Box<dyn GateStage>>,
}

impl Default for DepositGate {
    fn default() -> Self {
        Self::with_default_stages()
    }
}

impl DepositGate {
    /// Create a gate with an empty pipeline, which denies everything.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Create a gate with the default stage pipeline:
    /// PresentedCredentials -> DepositAuthFlag -> SelfDelivery ->
    /// DirectPreauth -> CredentialPreauth
    pub fn with_default_stages() -> Self {
        let mut gate = Self::new();
        gate.add_stage(Box::new(PresentedCredentialsStage));
        gate.add_stage(Box::new(DepositAuthFlagStage));
        gate.add_stage(Box::new(SelfDeliveryStage));
        gate.add_stage(Box::new(DirectPreauthStage));
        gate.add_stage(Box::new(CredentialPreauthStage));
        gate
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn GateStage>) {
        self.stages.push(stage);
    }

    /// Number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Evaluate a request through the pipeline.
    ///
    /// The first stage to authorize or deny decides. If every stage
    /// continues, the request is denied with `NoPermission`.
    pub fn authorize(
        &self,
        view: &dyn ReadView,
        request: &AuthorizationRequest,
        close_time: LedgerTime,
    ) -> GateOutcome {
        let mut context = GateContext::new(close_time);
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let decision = stage.evaluate(request, view, &mut context);

            let (passed, reason) = match &decision {
                StageDecision::Continue => (true, None),
                StageDecision::Authorize => (true, Some("authorized".to_string())),
                StageDecision::Deny(err) => (false, Some(err.to_string())),
            };
            let result = StageResult {
                stage_name: stage.name().to_string(),
                passed,
                reason,
            };
            stage_results.push(result.clone());
            context.previous_stages.push(result);

            let verdict = match decision {
                StageDecision::Continue => continue,
                StageDecision::Authorize => Ok(()),
                StageDecision::Deny(err) => Err(err),
            };
            debug!(
                stage = stage.name(),
                source = %request.source,
                destination = %request.destination,
                authorized = verdict.is_ok(),
                "deposit gate decided"
            );
            return GateOutcome {
                verdict,
                expired: context.expired,
                stage_results,
            };
        }

        debug!(
            source = %request.source,
            destination = %request.destination,
            "no stage authorized delivery"
        );
        GateOutcome {
            verdict: Err(TxError::NoPermission),
            expired: context.expired,
            stage_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    #[test]
    fn default_pipeline_has_five_stages() {
        assert_eq!(DepositGate::with_default_stages().stage_count(), 5);
    }

    #[test]
    fn empty_pipeline_denies() {
        let fx = Fixture::new();
        let outcome = DepositGate::new().authorize(
            &fx.ledger,
            &AuthorizationRequest::new(alice(), bob()),
            now(),
        );
        assert_eq!(outcome.verdict, Err(TxError::NoPermission));
        assert!(outcome.stage_results.is_empty());
    }

    #[test]
    fn evaluation_stops_at_first_decision() {
        let fx = Fixture::new();
        let outcome = DepositGate::with_default_stages().authorize(
            &fx.ledger,
            &AuthorizationRequest::new(alice(), bob()),
            now(),
        );
        assert!(outcome.is_authorized());
        let names: Vec<_> = outcome
            .stage_results
            .iter()
            .map(|r| r.stage_name.as_str())
            .collect();
        assert_eq!(names, ["presented-credentials", "deposit-auth-flag"]);
    }

    #[test]
    fn fallthrough_is_no_permission() {
        let mut fx = Fixture::new();
        fx.require_auth(bob());
        let outcome = DepositGate::with_default_stages().authorize(
            &fx.ledger,
            &AuthorizationRequest::new(alice(), bob()),
            now(),
        );
        assert_eq!(outcome.verdict, Err(TxError::NoPermission));
        assert_eq!(outcome.stage_results.len(), 5);
        assert!(outcome.stage_results.iter().all(|r| r.passed));
    }
}
