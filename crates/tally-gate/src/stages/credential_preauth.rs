use std::collections::BTreeSet;

use tally_ledger::{keylet, ReadView};
use tally_types::{CredentialSpec, TxError};

use crate::stage::{AuthorizationRequest, GateContext, GateStage, StageDecision};

/// The destination has preauthorized exactly the set of credential kinds the
/// source presented.
///
/// A stored set matches only when it is equal to the presented set; a
/// presented superset or subset does not match.
pub struct CredentialPreauthStage;

impl GateStage for CredentialPreauthStage {
    fn name(&self) -> &str {
        "credential-preauth"
    }

    fn evaluate(
        &self,
        request: &AuthorizationRequest,
        view: &dyn ReadView,
        context: &mut GateContext,
    ) -> StageDecision {
        if context.credentials.is_empty() {
            return StageDecision::Continue;
        }
        let presented: BTreeSet<CredentialSpec> =
            context.credentials.iter().map(|c| c.spec()).collect();
        let key = keylet::deposit_preauth_credentials(&request.destination, &presented);
        if view.deposit_preauth(&key.index).is_some() {
            StageDecision::Authorize
        } else {
            StageDecision::Deny(TxError::NoPermission)
        }
    }
}
