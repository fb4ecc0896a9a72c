use std::collections::BTreeSet;

use tally_ledger::credentials::{self, CredentialLookup};
use tally_ledger::ReadView;
use tally_types::limits::MAX_CREDENTIALS;
use tally_types::TxError;
use tracing::debug;

use crate::stage::{AuthorizationRequest, GateContext, GateStage, StageDecision};

/// Presented-credential verification.
///
/// Every presented id must name an accepted credential whose subject is the
/// source. A bad id fails the request even when the destination does not
/// require authorization. Expired credentials fail the request with
/// `Expired` and are recorded in the context for deletion.
pub struct PresentedCredentialsStage;

impl GateStage for PresentedCredentialsStage {
    fn name(&self) -> &str {
        "presented-credentials"
    }

    fn evaluate(
        &self,
        request: &AuthorizationRequest,
        view: &dyn ReadView,
        context: &mut GateContext,
    ) -> StageDecision {
        let Some(ids) = &request.credential_ids else {
            return StageDecision::Continue;
        };
        if ids.is_empty() || ids.len() > MAX_CREDENTIALS {
            return StageDecision::Deny(TxError::malformed(format!(
                "{} credential ids presented",
                ids.len()
            )));
        }
        let distinct: BTreeSet<_> = ids.iter().collect();
        if distinct.len() != ids.len() {
            return StageDecision::Deny(TxError::malformed("duplicate credential ids"));
        }

        let mut expired = Vec::new();
        for id in ids {
            let (credential, is_expired) = match credentials::resolve(view, id, context.close_time)
            {
                CredentialLookup::Missing => {
                    debug!(id = %id.short_hex(), "presented credential not found");
                    return StageDecision::Deny(TxError::BadCredentials);
                }
                CredentialLookup::Live(c) => (c, false),
                CredentialLookup::Expired(c) => (c, true),
            };
            if credential.subject != request.source || !credential.accepted {
                debug!(id = %id.short_hex(), "presented credential not held by source");
                return StageDecision::Deny(TxError::BadCredentials);
            }
            if is_expired {
                expired.push(*id);
            } else {
                context.credentials.push(credential);
            }
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "presented credentials expired");
            context.expired = expired;
            return StageDecision::Deny(TxError::Expired);
        }
        StageDecision::Continue
    }
}
