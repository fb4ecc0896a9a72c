use tally_ledger::ReadView;

use crate::stage::{AuthorizationRequest, GateContext, GateStage, StageDecision};

/// Destinations without deposit authorization accept from anyone.
///
/// A missing destination is authorized here; whether it may be created or
/// must exist is the calling transaction's concern.
pub struct DepositAuthFlagStage;

impl GateStage for DepositAuthFlagStage {
    fn name(&self) -> &str {
        "deposit-auth-flag"
    }

    fn evaluate(
        &self,
        request: &AuthorizationRequest,
        view: &dyn ReadView,
        _context: &mut GateContext,
    ) -> StageDecision {
        match view.account(&request.destination) {
            Some(root) if root.flags.deposit_auth => StageDecision::Continue,
            _ => StageDecision::Authorize,
        }
    }
}
