use serde::{Deserialize, Serialize};
use tally_ledger::{Credential, ReadView};
use tally_types::{AccountId, LedgerTime, ObjectIndex, TxError};

// ---------------------------------------------------------------------------
// AuthorizationRequest
// ---------------------------------------------------------------------------

/// A request to deliver value from `source` to `destination`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub destination: AccountId,
    pub source: AccountId,
    /// Credential ids the source presents, if any.
    pub credential_ids: Option<Vec<ObjectIndex>>,
}

impl AuthorizationRequest {
    pub fn new(source: AccountId, destination: AccountId) -> Self {
        Self {
            destination,
            source,
            credential_ids: None,
        }
    }

    pub fn with_credentials(mut self, ids: Vec<ObjectIndex>) -> Self {
        self.credential_ids = Some(ids);
        self
    }
}

// ---------------------------------------------------------------------------
// StageDecision
// ---------------------------------------------------------------------------

/// The outcome of a single gate stage evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// Delivery is permitted; later stages are skipped.
    Authorize,
    /// This stage has no opinion; proceed to the next stage.
    Continue,
    /// Delivery is refused with the given result.
    Deny(TxError),
}

impl StageDecision {
    pub fn is_authorize(&self) -> bool {
        matches!(self, Self::Authorize)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Self::Deny(_))
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage evaluation.
#[derive(Clone, Debug)]
pub struct StageResult {
    /// Name of the stage that produced this result.
    pub stage_name: String,
    /// Whether the stage let the request through (authorized or continued).
    pub passed: bool,
    /// Populated when the stage denied or authorized.
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// GateContext
// ---------------------------------------------------------------------------

/// State shared by the stages of one evaluation.
pub struct GateContext {
    /// Close time of the ledger being built.
    pub close_time: LedgerTime,
    /// Presented credentials that resolved and are live, in presentation order.
    pub credentials: Vec<Credential>,
    /// Presented credentials found expired. The caller deletes these.
    pub expired: Vec<ObjectIndex>,
    /// Results from stages that have already run in this evaluation.
    pub previous_stages: Vec<StageResult>,
}

impl GateContext {
    pub fn new(close_time: LedgerTime) -> Self {
        Self {
            close_time,
            credentials: Vec::new(),
            expired: Vec::new(),
            previous_stages: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// GateStage trait
// ---------------------------------------------------------------------------

/// A single evaluation stage in the gate pipeline.
///
/// Stages are evaluated in order; the first that authorizes or denies ends
/// the evaluation. Stages read the ledger but never write it.
///
/// The trait is object-safe and `Send + Sync` so stages can be stored in
/// a `Vec<Box<dyn GateStage>>`.
pub trait GateStage: Send + Sync {
    /// Human-readable name of this stage (e.g., "self-delivery").
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        request: &AuthorizationRequest,
        view: &dyn ReadView,
        context: &mut GateContext,
    ) -> StageDecision;
}
