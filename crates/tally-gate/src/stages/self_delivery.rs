use tally_ledger::ReadView;

use crate::stage::{AuthorizationRequest, GateContext, GateStage, StageDecision};

/// An account may always deliver to itself.
pub struct SelfDeliveryStage;

impl GateStage for SelfDeliveryStage {
    fn name(&self) -> &str {
        "self-delivery"
    }

    fn evaluate(
        &self,
        request: &AuthorizationRequest,
        _view: &dyn ReadView,
        _context: &mut GateContext,
    ) -> StageDecision {
        if request.source == request.destination {
            StageDecision::Authorize
        } else {
            StageDecision::Continue
        }
    }
}
