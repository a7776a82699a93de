//! Risk event definitions
//!
//! Structured records emitted by the risk engine for external
//! observability. The log is append-only; events are immutable once
//! emitted and indexable by their time-sortable id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which validator produced a failure record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckType {
    /// Loan-to-value bound
    Ltv,
    /// Quote age bound
    PriceStaleness,
    /// Confidence/price ratio bound
    PriceConfidence,
    /// Expected-vs-actual price deviation bound
    Slippage,
    /// Position size bound
    PositionSize,
    /// Rejected because the system is paused
    Paused,
}

/// Event emitted by the risk engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub event_id: Uuid,
    pub event_type: RiskEventType,
    pub timestamp: i64,
}

/// Risk event classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskEventType {
    /// A validator rejected its input (boolean or abort variant alike)
    CheckFailed {
        check_type: CheckType,
        actual_value: u64,
        threshold: u64,
    },
    /// Risk parameters were replaced through a capability-gated call
    ConfigUpdated,
    /// Emergency pause engaged
    SystemPaused { reason: String },
    /// Pause lifted; prior thresholds apply unchanged
    SystemResumed,
}

impl RiskEvent {
    pub fn new(event_type: RiskEventType, timestamp: i64) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type,
            timestamp,
        }
    }
}
