//! Orchestration error taxonomy
//!
//! Venue rejections carry the step that failed so the caller can tell
//! where the unit aborted. `CompensationFailed` is the one state that
//! is not all-or-nothing: a step failed and a compensating action also
//! failed, leaving external state that needs manual reconciliation. It
//! is kept distinct so monitoring can page on it.

use risk_engine::RiskError;
use thiserror::Error;
use vault::VaultError;

use crate::intent::Step;
use crate::plan::PlanError;
use crate::venues::VenueError;

/// Errors from the saga driver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("Plan derivation failed: {0}")]
    Plan(#[from] PlanError),

    #[error("Risk check rejected: {0}")]
    Risk(#[from] RiskError),

    #[error("Ledger rejected: {0}")]
    Vault(#[from] VaultError),

    #[error("Venue rejected step {step:?}: {source}")]
    Venue {
        step: Step,
        #[source]
        source: VenueError,
    },

    #[error("Hedge size {hedge_size} below venue minimum order {minimum}")]
    BelowMinimumOrder { hedge_size: u64, minimum: u64 },

    #[error("Vault holds {available} collateral, position needs {requested}")]
    InsufficientCollateral { requested: u64, available: u64 },

    #[error("Position has no open hedge to close")]
    NothingToClose,

    #[error("Compensation for step {step:?} failed: {detail}")]
    CompensationFailed { step: Step, detail: String },
}

impl OrchestratorError {
    pub(crate) fn venue(step: Step, source: VenueError) -> Self {
        Self::Venue { step, source }
    }

    pub(crate) fn compensation(step: Step, source: &VenueError) -> Self {
        Self::CompensationFailed {
            step,
            detail: source.to_string(),
        }
    }
}
