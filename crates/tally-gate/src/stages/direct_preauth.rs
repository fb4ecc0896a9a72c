use tally_ledger::{keylet, ReadView};

use crate::stage::{AuthorizationRequest, GateContext, GateStage, StageDecision};

/// The destination has preauthorized the source account by name.
pub struct DirectPreauthStage;

impl GateStage for DirectPreauthStage {
    fn name(&self) -> &str {
        "direct-preauth"
    }

    fn evaluate(
        &self,
        request: &AuthorizationRequest,
        view: &dyn ReadView,
        _context: &mut GateContext,
    ) -> StageDecision {
        let key = keylet::deposit_preauth(&request.destination, &request.source);
        if view.deposit_preauth(&key.index).is_some() {
            StageDecision::Authorize
        } else {
            StageDecision::Continue
        }
    }
}
