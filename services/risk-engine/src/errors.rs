//! Risk engine error taxonomy
//!
//! Validation failures carry the measured value and the violated
//! threshold so tooling can classify failures without parsing text.
//! `Paused` is a distinct variant, not a validation failure: monitoring
//! must be able to tell "parameters violated" apart from "system halted".

use thiserror::Error;

use crate::events::CheckType;

/// Abort-variant errors from the risk validators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("System is paused")]
    Paused,

    #[error("LTV {ltv_bps} bps exceeds maximum {max_ltv_bps} bps")]
    LtvExceeded { ltv_bps: u64, max_ltv_bps: u64 },

    #[error("Price is stale: age {age_seconds}s exceeds maximum {max_age_seconds}s")]
    StalePrice {
        age_seconds: i64,
        max_age_seconds: i64,
    },

    #[error("Confidence ratio {ratio_bps} bps exceeds maximum {max_ratio_bps} bps")]
    ConfidenceTooWide { ratio_bps: u64, max_ratio_bps: u64 },

    #[error("Slippage {slippage_bps} bps exceeds maximum {max_slippage_bps} bps")]
    SlippageExceeded {
        slippage_bps: u64,
        max_slippage_bps: u64,
    },

    #[error("Position size {size} exceeds maximum {max_size}")]
    PositionTooLarge { size: u64, max_size: u64 },
}

impl RiskError {
    /// The check this error corresponds to.
    pub fn check_type(&self) -> CheckType {
        match self {
            RiskError::Paused => CheckType::Paused,
            RiskError::LtvExceeded { .. } => CheckType::Ltv,
            RiskError::StalePrice { .. } => CheckType::PriceStaleness,
            RiskError::ConfidenceTooWide { .. } => CheckType::PriceConfidence,
            RiskError::SlippageExceeded { .. } => CheckType::Slippage,
            RiskError::PositionTooLarge { .. } => CheckType::PositionSize,
        }
    }

    /// Measured value and violated threshold, for the failure record.
    pub fn actual_and_threshold(&self) -> (u64, u64) {
        match *self {
            RiskError::Paused => (1, 0),
            RiskError::LtvExceeded {
                ltv_bps,
                max_ltv_bps,
            } => (ltv_bps, max_ltv_bps),
            RiskError::StalePrice {
                age_seconds,
                max_age_seconds,
            } => (age_seconds.max(0) as u64, max_age_seconds.max(0) as u64),
            RiskError::ConfidenceTooWide {
                ratio_bps,
                max_ratio_bps,
            } => (ratio_bps, max_ratio_bps),
            RiskError::SlippageExceeded {
                slippage_bps,
                max_slippage_bps,
            } => (slippage_bps, max_slippage_bps),
            RiskError::PositionTooLarge { size, max_size } => (size, max_size),
        }
    }
}
