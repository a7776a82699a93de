//! External venue interfaces
//!
//! The orchestrator talks to three collaborators: a price oracle, a
//! lending venue that custodies collateral and issues debt, and an
//! execution venue that takes bounded-price orders. Each is a trait so
//! the saga driver is generic over real adapters and the in-memory
//! simulated venues used in tests.
//!
//! Handles returned by venue calls (`CustodyReceipt`, `DebtHandle`,
//! `OrderHandle`) are the inputs to the corresponding compensating
//! actions; the saga keeps them alive until the unit settles.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::ids::{DebtId, FeedId, OrderId, ReceiptId};
use types::quote::PriceQuote;

/// Venue rejection reasons.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VenueError {
    #[error("No quote available for feed: {feed_id}")]
    FeedNotFound { feed_id: String },

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u64, available: u64 },

    #[error("Order quantity {quantity} below venue minimum {minimum}")]
    BelowMinimum { quantity: u64, minimum: u64 },

    #[error("Market moved outside the limit price {limit}")]
    PriceOutsideTolerance { limit: Decimal },

    #[error("Unknown custody receipt: {receipt_id}")]
    ReceiptNotFound { receipt_id: String },

    #[error("Unknown debt handle: {debt_id}")]
    DebtNotFound { debt_id: String },

    #[error("Unknown order: {order_id}")]
    OrderNotFound { order_id: String },

    #[error("Venue unavailable: {venue}")]
    Unavailable { venue: String },
}

/// Proof of collateral locked with the custody/lending venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyReceipt {
    pub receipt_id: ReceiptId,
    pub amount: u64,
}

/// Handle to debt drawn from the lending venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtHandle {
    pub debt_id: DebtId,
    pub amount: u64,
}

/// Handle to a resting limit order on the execution venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHandle {
    pub order_id: OrderId,
    pub quantity: u64,
    pub limit_price: Decimal,
}

/// Read-only price source.
pub trait PriceOracle {
    /// Fetch the latest quote for a feed.
    fn get_quote(&self, feed_id: &FeedId) -> Result<PriceQuote, VenueError>;
}

/// Collateral custody and debt issuance.
pub trait LendingVenue {
    /// Lock collateral, returning a receipt that releases it.
    fn lock_collateral(&mut self, amount: u64) -> Result<CustodyReceipt, VenueError>;

    /// Release previously locked collateral. Compensation for
    /// `lock_collateral`.
    fn unlock_collateral(&mut self, receipt: &CustodyReceipt) -> Result<(), VenueError>;

    /// Draw debt against a custody receipt.
    fn borrow(&mut self, receipt: &CustodyReceipt, amount: u64) -> Result<DebtHandle, VenueError>;

    /// Repay drawn debt in full. Compensation for `borrow`.
    fn repay(&mut self, debt: &DebtHandle) -> Result<(), VenueError>;
}

/// Bounded-price order execution.
pub trait ExecutionVenue {
    /// Smallest order quantity the venue accepts, in base minor units.
    fn min_order_size(&self) -> u64;

    /// Place a limit order. `is_bid` true buys the base asset, false
    /// sells it; `limit_price` is the worst acceptable price.
    fn place_limit_order(
        &mut self,
        feed_id: &FeedId,
        is_bid: bool,
        limit_price: Decimal,
        quantity: u64,
        expiry: i64,
    ) -> Result<OrderHandle, VenueError>;

    /// Cancel a resting order. Compensation for `place_limit_order`.
    fn cancel_order(&mut self, order: &OrderHandle) -> Result<(), VenueError>;
}
