//! Pure risk-check arithmetic
//!
//! Deterministic basis-point computations shared by the boolean and
//! abort validator variants. All divisions floor toward zero: rounding
//! a ratio down never makes a position look riskier than it is, and the
//! thresholds are compared with strict `>` so the bias is conservative.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Basis points per whole unit.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Loan-to-value ratio in basis points: `floor(borrow × 10000 / collateral)`.
///
/// Zero collateral is maximal LTV unless the borrow is also zero —
/// an empty, debt-free vault is safe, an undercollateralized one never is.
pub fn ltv_bps(collateral_value: u64, borrow_value: u64) -> u64 {
    if collateral_value == 0 {
        return if borrow_value == 0 { 0 } else { u64::MAX };
    }
    let ratio = (borrow_value as u128 * BPS_DENOMINATOR) / collateral_value as u128;
    ratio.min(u64::MAX as u128) as u64
}

/// Symmetric slippage in basis points:
/// `floor(|actual − expected| × 10000 / expected)`.
///
/// A zero expected price is valid only when the actual price is also
/// zero; any deviation from zero is maximal slippage.
pub fn slippage_bps(expected: Decimal, actual: Decimal) -> u64 {
    if expected.is_zero() {
        return if actual.is_zero() { 0 } else { u64::MAX };
    }
    let deviation = (actual - expected).abs();
    let ratio = deviation * Decimal::from(10_000u64) / expected.abs();
    ratio.trunc().to_u64().unwrap_or(u64::MAX)
}

/// Confidence band width relative to price, in basis points.
///
/// A non-positive price cannot be divided by and is treated as
/// maximally uncertain.
pub fn confidence_ratio_bps(price: i64, confidence: u64) -> u64 {
    if price <= 0 {
        return u64::MAX;
    }
    let ratio = (confidence as u128 * BPS_DENOMINATOR) / price as u128;
    ratio.min(u64::MAX as u128) as u64
}

/// Whether a quote published at `publish_time` is still fresh at `now`.
/// The boundary `now == publish_time + max_age` is accepted.
pub fn is_fresh(publish_time: i64, now: i64, max_age_seconds: i64) -> bool {
    now <= publish_time.saturating_add(max_age_seconds)
}
