//! Hedge plan derivation
//!
//! A `HedgePlan` is the ephemeral output of one derivation call:
//! given collateral, a reference price, a target LTV, and a slippage
//! tolerance, it fixes the borrow amount, the hedge size, and the
//! worst-acceptable limit price for the sell leg. Consumed immediately
//! by the composition step, never persisted.
//!
//! All divisions floor. The hedge covers only the borrowed fraction of
//! the collateral, so `collateral × (1 − target_fraction)` remains as
//! residual exposure; full neutrality would need a target fraction of
//! 1, which the LTV ceiling disallows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::scale::{self, ScaleError, COLLATERAL_DECIMALS, QUOTE_DECIMALS};

const BPS_DENOMINATOR: u128 = 10_000;

/// Plan derivation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Reference price must be positive")]
    NonPositivePrice,

    #[error("Arithmetic overflow in plan derivation")]
    Overflow,

    #[error("Scale conversion failed: {0}")]
    Scale(#[from] ScaleError),
}

/// One derived hedge plan: how much to borrow and how large a short
/// hedge to place against it, with a bounded worst-case price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgePlan {
    /// Collateral backing the position, collateral minor units
    pub collateral_amount: u64,
    /// Collateral valued at the reference price, quote minor units
    pub collateral_value: u64,
    /// Debt to draw, quote minor units
    pub borrow_amount: u64,
    /// Short hedge size, collateral minor units
    pub hedge_size: u64,
    /// Oracle price the plan was derived from
    pub reference_price: Decimal,
    /// Worst acceptable price for the sell leg
    pub limit_price: Decimal,
    /// Slippage tolerance baked into `limit_price`, bps
    pub slippage_bps: u64,
}

impl HedgePlan {
    /// Derive a plan from a reference price.
    ///
    /// `target_ltv_bps` is the fraction of collateral value to borrow,
    /// in basis points. The projected LTV still has to pass the risk
    /// engine separately; derivation only fixes the numbers.
    pub fn derive(
        collateral_amount: u64,
        price: Decimal,
        target_ltv_bps: u64,
        slippage_bps: u64,
    ) -> Result<Self, PlanError> {
        if price <= Decimal::ZERO {
            return Err(PlanError::NonPositivePrice);
        }

        let collateral_value = scale::collateral_value_minor(collateral_amount, price)?;

        let borrow_amount = (collateral_value as u128)
            .checked_mul(target_ltv_bps as u128)
            .map(|v| v / BPS_DENOMINATOR)
            .and_then(|v| u64::try_from(v).ok())
            .ok_or(PlanError::Overflow)?;

        // hedge_size = borrow_amount / price, floored to collateral units
        let hedge_decimal = scale::from_minor(borrow_amount, QUOTE_DECIMALS)
            .checked_div(price)
            .ok_or(PlanError::Overflow)?;
        let hedge_size = scale::to_minor(hedge_decimal, COLLATERAL_DECIMALS)?;

        let limit_price = sell_limit_price(price, slippage_bps)?;

        Ok(Self {
            collateral_amount,
            collateral_value,
            borrow_amount,
            hedge_size,
            reference_price: price,
            limit_price,
            slippage_bps,
        })
    }

    /// Collateral left unhedged by construction, collateral minor units.
    pub fn residual_exposure(&self) -> u64 {
        self.collateral_amount.saturating_sub(self.hedge_size)
    }
}

/// Worst acceptable price for a short/sell leg:
/// `price × (1 − slippage_bps/10000)`.
pub fn sell_limit_price(price: Decimal, slippage_bps: u64) -> Result<Decimal, PlanError> {
    let tolerance = Decimal::from(slippage_bps)
        .checked_div(Decimal::from(BPS_DENOMINATOR as u64))
        .ok_or(PlanError::Overflow)?;
    price
        .checked_mul(Decimal::ONE - tolerance)
        .ok_or(PlanError::Overflow)
}

/// Worst acceptable price for a cover/buy leg:
/// `price × (1 + slippage_bps/10000)`.
pub fn buy_limit_price(price: Decimal, slippage_bps: u64) -> Result<Decimal, PlanError> {
    let tolerance = Decimal::from(slippage_bps)
        .checked_div(Decimal::from(BPS_DENOMINATOR as u64))
        .ok_or(PlanError::Overflow)?;
    price
        .checked_mul(Decimal::ONE + tolerance)
        .ok_or(PlanError::Overflow)
}
