//! Globally shared risk parameters
//!
//! A single `RiskParameters` value is shared by every validator call:
//! frequently read, rarely written. Writes go through the capability-
//! gated methods on [`crate::engine::RiskEngine`] only.

use serde::{Deserialize, Serialize};

/// Protocol-wide risk thresholds and the emergency pause switch.
///
/// All ratios are integer basis points (1 bps = 1/10000); sizes and
/// values are integer minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Maximum loan-to-value ratio in basis points
    pub max_ltv_bps: u64,
    /// Maximum accepted quote age in seconds (boundary age accepted)
    pub max_price_age_seconds: i64,
    /// Maximum confidence/price ratio in basis points
    pub max_confidence_ratio_bps: u64,
    /// Maximum deviation between expected and executed price, in bps
    pub max_slippage_bps: u64,
    /// Maximum single position size in collateral minor units
    pub max_position_size: u64,
    /// While set, every validator rejects regardless of other inputs
    pub system_paused: bool,
    /// Unix time (seconds) of the last parameter update
    pub last_updated: i64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            max_ltv_bps: 7_500,
            max_price_age_seconds: 60,
            max_confidence_ratio_bps: 200,
            max_slippage_bps: 50,
            max_position_size: 1_000_000_000_000,
            system_paused: false,
            last_updated: 0,
        }
    }
}
