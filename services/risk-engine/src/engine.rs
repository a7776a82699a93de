//! Risk engine
//!
//! Holds the shared `RiskParameters`, runs the four validators, and
//! keeps the append-only failure-event log. Boolean `validate_*`
//! variants let callers branch; `assert_*` variants abort with a
//! structured error. Both paths record the same failure event.
//!
//! `system_paused` short-circuits every validator to rejection before
//! any other check runs.

use rust_decimal::Decimal;
use types::capability::AdminCapability;
use types::quote::PriceQuote;

use crate::checks;
use crate::errors::RiskError;
use crate::events::{RiskEvent, RiskEventType};
use crate::params::RiskParameters;

/// Stateless-per-call validator over globally shared parameters.
#[derive(Debug)]
pub struct RiskEngine {
    params: RiskParameters,
    /// Emitted events log (append-only)
    events: Vec<RiskEvent>,
}

impl RiskEngine {
    /// Create an engine with default parameters.
    pub fn new(now: i64) -> Self {
        Self::with_params(RiskParameters {
            last_updated: now,
            ..RiskParameters::default()
        })
    }

    /// Create an engine with explicit parameters.
    pub fn with_params(params: RiskParameters) -> Self {
        Self {
            params,
            events: Vec::new(),
        }
    }

    /// Current risk parameters. Reads never block or mutate.
    pub fn params(&self) -> &RiskParameters {
        &self.params
    }

    /// Whether the emergency pause is engaged.
    pub fn is_paused(&self) -> bool {
        self.params.system_paused
    }

    // ───────────────────────── LTV ─────────────────────────

    /// Boolean LTV check: `floor(borrow × 10000 / collateral)` against
    /// `max_ltv_bps`. Zero collateral accepts only a zero borrow.
    pub fn validate_ltv(&mut self, collateral_value: u64, borrow_value: u64, now: i64) -> bool {
        let result = self.check_ltv(collateral_value, borrow_value);
        self.record_outcome(result, now)
    }

    /// Abort LTV check. Returns the computed LTV in bps on success.
    pub fn assert_ltv(
        &mut self,
        collateral_value: u64,
        borrow_value: u64,
        now: i64,
    ) -> Result<u64, RiskError> {
        let result = self.check_ltv(collateral_value, borrow_value);
        self.record_err(result, now)
    }

    fn check_ltv(&self, collateral_value: u64, borrow_value: u64) -> Result<u64, RiskError> {
        self.check_not_paused()?;
        let ltv_bps = checks::ltv_bps(collateral_value, borrow_value);
        if ltv_bps > self.params.max_ltv_bps {
            return Err(RiskError::LtvExceeded {
                ltv_bps,
                max_ltv_bps: self.params.max_ltv_bps,
            });
        }
        Ok(ltv_bps)
    }

    // ───────────────────────── Price ─────────────────────────

    /// Boolean freshness + confidence check on an oracle quote.
    pub fn validate_price(&mut self, quote: &PriceQuote, now: i64) -> bool {
        let result = self.check_price(quote, now);
        self.record_outcome(result, now)
    }

    /// Abort freshness + confidence check.
    pub fn assert_price(&mut self, quote: &PriceQuote, now: i64) -> Result<(), RiskError> {
        let result = self.check_price(quote, now);
        self.record_err(result, now)
    }

    fn check_price(&self, quote: &PriceQuote, now: i64) -> Result<(), RiskError> {
        self.check_not_paused()?;

        if !checks::is_fresh(quote.publish_time, now, self.params.max_price_age_seconds) {
            return Err(RiskError::StalePrice {
                age_seconds: quote.age_seconds(now),
                max_age_seconds: self.params.max_price_age_seconds,
            });
        }

        let ratio_bps = checks::confidence_ratio_bps(quote.price, quote.confidence);
        if ratio_bps > self.params.max_confidence_ratio_bps {
            return Err(RiskError::ConfidenceTooWide {
                ratio_bps,
                max_ratio_bps: self.params.max_confidence_ratio_bps,
            });
        }

        Ok(())
    }

    // ───────────────────────── Slippage ─────────────────────────

    /// Boolean expected-vs-actual price deviation check.
    pub fn validate_slippage(&mut self, expected: Decimal, actual: Decimal, now: i64) -> bool {
        let result = self.check_slippage(expected, actual);
        self.record_outcome(result, now)
    }

    /// Abort slippage check. Returns the deviation in bps on success.
    pub fn assert_slippage(
        &mut self,
        expected: Decimal,
        actual: Decimal,
        now: i64,
    ) -> Result<u64, RiskError> {
        let result = self.check_slippage(expected, actual);
        self.record_err(result, now)
    }

    fn check_slippage(&self, expected: Decimal, actual: Decimal) -> Result<u64, RiskError> {
        self.check_not_paused()?;
        let slippage_bps = checks::slippage_bps(expected, actual);
        if slippage_bps > self.params.max_slippage_bps {
            return Err(RiskError::SlippageExceeded {
                slippage_bps,
                max_slippage_bps: self.params.max_slippage_bps,
            });
        }
        Ok(slippage_bps)
    }

    // ───────────────────────── Position size ─────────────────────────

    /// Boolean position-size bound check.
    pub fn validate_position_size(&mut self, size: u64, now: i64) -> bool {
        let result = self.check_position_size(size);
        self.record_outcome(result, now)
    }

    /// Abort position-size bound check.
    pub fn assert_position_size(&mut self, size: u64, now: i64) -> Result<(), RiskError> {
        let result = self.check_position_size(size);
        self.record_err(result, now)
    }

    fn check_position_size(&self, size: u64) -> Result<(), RiskError> {
        self.check_not_paused()?;
        if size > self.params.max_position_size {
            return Err(RiskError::PositionTooLarge {
                size,
                max_size: self.params.max_position_size,
            });
        }
        Ok(())
    }

    // ───────────────────────── Pause gate ─────────────────────────

    /// Gate for ledger mutations with no threshold of their own: fails
    /// with `RiskError::Paused` while the pause switch is engaged, and
    /// records the rejection like any other check.
    pub fn assert_not_paused(&mut self, now: i64) -> Result<(), RiskError> {
        let result = self.check_not_paused();
        self.record_err(result, now)
    }

    fn check_not_paused(&self) -> Result<(), RiskError> {
        if self.params.system_paused {
            return Err(RiskError::Paused);
        }
        Ok(())
    }

    // ───────────────────────── Admin ─────────────────────────

    /// Replace the risk parameters. Requires the admin capability.
    ///
    /// The pause switch is carried over from the current parameters so
    /// a config update cannot silently resume a halted system.
    pub fn update_params(
        &mut self,
        _cap: &AdminCapability,
        mut new_params: RiskParameters,
        now: i64,
    ) {
        new_params.system_paused = self.params.system_paused;
        new_params.last_updated = now;
        self.params = new_params;
        self.events
            .push(RiskEvent::new(RiskEventType::ConfigUpdated, now));
    }

    /// Engage the emergency pause. Requires the admin capability.
    pub fn pause(&mut self, _cap: &AdminCapability, reason: impl Into<String>, now: i64) {
        self.params.system_paused = true;
        self.params.last_updated = now;
        self.events.push(RiskEvent::new(
            RiskEventType::SystemPaused {
                reason: reason.into(),
            },
            now,
        ));
    }

    /// Lift the pause; thresholds resume unchanged. Requires the admin
    /// capability.
    pub fn resume(&mut self, _cap: &AdminCapability, now: i64) {
        self.params.system_paused = false;
        self.params.last_updated = now;
        self.events
            .push(RiskEvent::new(RiskEventType::SystemResumed, now));
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[RiskEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<RiskEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal ─────────────────────────

    fn record_outcome<T>(&mut self, result: Result<T, RiskError>, now: i64) -> bool {
        match result {
            Ok(_) => true,
            Err(err) => {
                self.record_failure(&err, now);
                false
            }
        }
    }

    fn record_err<T>(&mut self, result: Result<T, RiskError>, now: i64) -> Result<T, RiskError> {
        result.map_err(|err| {
            self.record_failure(&err, now);
            err
        })
    }

    fn record_failure(&mut self, err: &RiskError, now: i64) {
        let (actual_value, threshold) = err.actual_and_threshold();
        self.events.push(RiskEvent::new(
            RiskEventType::CheckFailed {
                check_type: err.check_type(),
                actual_value,
                threshold,
            },
            now,
        ));
    }
}
