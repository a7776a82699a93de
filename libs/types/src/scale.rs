//! Minor-unit fixed-point conversion
//!
//! Monetary amounts are carried as integer minor units at a fixed
//! per-asset decimal scale. The collateral asset uses 9 decimals
//! (1 token = 1_000_000_000 minor units), the quote asset uses 6
//! decimals. All conversions floor toward zero so rounding never
//! overstates a balance or a borrow.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Decimal places of the collateral asset (e.g. lamport-style 9)
pub const COLLATERAL_DECIMALS: u32 = 9;

/// Decimal places of the quote asset (e.g. USD stable 6)
pub const QUOTE_DECIMALS: u32 = 6;

/// Conversion errors between decimal values and minor units
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScaleError {
    #[error("Value is negative and cannot be expressed in minor units")]
    Negative,

    #[error("Value overflows the minor-unit range")]
    Overflow,
}

/// Convert a decimal token value to integer minor units, flooring
/// toward zero.
pub fn to_minor(value: Decimal, decimals: u32) -> Result<u64, ScaleError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ScaleError::Negative);
    }
    let factor = Decimal::from(10u64.pow(decimals));
    let scaled = value.checked_mul(factor).ok_or(ScaleError::Overflow)?;
    scaled.trunc().to_u64().ok_or(ScaleError::Overflow)
}

/// Convert integer minor units back to a decimal token value.
pub fn from_minor(minor: u64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(minor as i128, decimals)
}

/// Build a decimal from a mantissa and a power-of-ten exponent
/// (oracle wire format: `value = mantissa × 10^exponent`).
pub fn scaled_decimal(mantissa: i64, exponent: i32) -> Decimal {
    if exponent < 0 {
        Decimal::from_i128_with_scale(mantissa as i128, exponent.unsigned_abs())
    } else {
        Decimal::from_i128_with_scale(
            (mantissa as i128).saturating_mul(10i128.pow(exponent as u32)),
            0,
        )
    }
}

/// Value of a collateral amount at a given price, in quote minor units
/// (floored).
pub fn collateral_value_minor(
    collateral_minor: u64,
    price: Decimal,
) -> Result<u64, ScaleError> {
    if price.is_sign_negative() {
        return Err(ScaleError::Negative);
    }
    let tokens = from_minor(collateral_minor, COLLATERAL_DECIMALS);
    let value = tokens.checked_mul(price).ok_or(ScaleError::Overflow)?;
    to_minor(value, QUOTE_DECIMALS)
}
