//! In-memory simulated venues
//!
//! Deterministic stand-ins for the three venue traits, with per-call
//! fault switches so tests can fail the saga at any step and assert
//! the all-or-nothing contract. State is inspectable: locked
//! collateral, outstanding debt, and resting orders are all queryable
//! after the fact.

use rust_decimal::Decimal;
use std::collections::HashMap;
use types::ids::{DebtId, FeedId, OrderId, ReceiptId};
use types::quote::PriceQuote;

use crate::venues::{
    CustodyReceipt, DebtHandle, ExecutionVenue, LendingVenue, OrderHandle, PriceOracle, VenueError,
};

/// Oracle serving pre-set quotes per feed.
#[derive(Debug, Default)]
pub struct SimOracle {
    quotes: HashMap<FeedId, PriceQuote>,
}

impl SimOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_quote(&mut self, feed_id: FeedId, quote: PriceQuote) {
        self.quotes.insert(feed_id, quote);
    }
}

impl PriceOracle for SimOracle {
    fn get_quote(&self, feed_id: &FeedId) -> Result<PriceQuote, VenueError> {
        self.quotes
            .get(feed_id)
            .copied()
            .ok_or_else(|| VenueError::FeedNotFound {
                feed_id: feed_id.to_string(),
            })
    }
}

/// Lending venue with a fixed liquidity pool and fault switches.
#[derive(Debug)]
pub struct SimLendingVenue {
    /// Quote minor units available to lend
    liquidity: u64,
    locked: HashMap<ReceiptId, u64>,
    debts: HashMap<DebtId, u64>,
    pub fail_lock: bool,
    pub fail_borrow: bool,
    pub fail_unlock: bool,
    pub fail_repay: bool,
}

impl SimLendingVenue {
    pub fn new(liquidity: u64) -> Self {
        Self {
            liquidity,
            locked: HashMap::new(),
            debts: HashMap::new(),
            fail_lock: false,
            fail_borrow: false,
            fail_unlock: false,
            fail_repay: false,
        }
    }

    /// Total collateral currently locked, collateral minor units.
    pub fn locked_total(&self) -> u64 {
        self.locked.values().sum()
    }

    /// Total debt currently drawn, quote minor units.
    pub fn outstanding_debt(&self) -> u64 {
        self.debts.values().sum()
    }
}

impl LendingVenue for SimLendingVenue {
    fn lock_collateral(&mut self, amount: u64) -> Result<CustodyReceipt, VenueError> {
        if self.fail_lock {
            return Err(VenueError::Unavailable {
                venue: "lending".to_string(),
            });
        }
        let receipt_id = ReceiptId::new();
        self.locked.insert(receipt_id, amount);
        Ok(CustodyReceipt { receipt_id, amount })
    }

    fn unlock_collateral(&mut self, receipt: &CustodyReceipt) -> Result<(), VenueError> {
        if self.fail_unlock {
            return Err(VenueError::Unavailable {
                venue: "lending".to_string(),
            });
        }
        self.locked
            .remove(&receipt.receipt_id)
            .map(|_| ())
            .ok_or_else(|| VenueError::ReceiptNotFound {
                receipt_id: receipt.receipt_id.to_string(),
            })
    }

    fn borrow(&mut self, receipt: &CustodyReceipt, amount: u64) -> Result<DebtHandle, VenueError> {
        if self.fail_borrow {
            return Err(VenueError::Unavailable {
                venue: "lending".to_string(),
            });
        }
        if !self.locked.contains_key(&receipt.receipt_id) {
            return Err(VenueError::ReceiptNotFound {
                receipt_id: receipt.receipt_id.to_string(),
            });
        }
        let available = self.liquidity.saturating_sub(self.outstanding_debt());
        if amount > available {
            return Err(VenueError::InsufficientLiquidity {
                requested: amount,
                available,
            });
        }
        let debt_id = DebtId::new();
        self.debts.insert(debt_id, amount);
        Ok(DebtHandle { debt_id, amount })
    }

    fn repay(&mut self, debt: &DebtHandle) -> Result<(), VenueError> {
        if self.fail_repay {
            return Err(VenueError::Unavailable {
                venue: "lending".to_string(),
            });
        }
        self.debts
            .remove(&debt.debt_id)
            .map(|_| ())
            .ok_or_else(|| VenueError::DebtNotFound {
                debt_id: debt.debt_id.to_string(),
            })
    }
}

/// Execution venue accepting any order at or above the minimum size.
#[derive(Debug)]
pub struct SimExecutionVenue {
    min_order: u64,
    orders: HashMap<OrderId, OrderHandle>,
    pub fail_place: bool,
    pub fail_cancel: bool,
}

impl SimExecutionVenue {
    pub fn new(min_order: u64) -> Self {
        Self {
            min_order,
            orders: HashMap::new(),
            fail_place: false,
            fail_cancel: false,
        }
    }

    pub fn open_order_count(&self) -> usize {
        self.orders.len()
    }
}

impl ExecutionVenue for SimExecutionVenue {
    fn min_order_size(&self) -> u64 {
        self.min_order
    }

    fn place_limit_order(
        &mut self,
        _feed_id: &FeedId,
        _is_bid: bool,
        limit_price: Decimal,
        quantity: u64,
        _expiry: i64,
    ) -> Result<OrderHandle, VenueError> {
        if self.fail_place {
            return Err(VenueError::PriceOutsideTolerance { limit: limit_price });
        }
        if quantity < self.min_order {
            return Err(VenueError::BelowMinimum {
                quantity,
                minimum: self.min_order,
            });
        }
        let order_id = OrderId::new();
        let handle = OrderHandle {
            order_id,
            quantity,
            limit_price,
        };
        self.orders.insert(order_id, handle.clone());
        Ok(handle)
    }

    fn cancel_order(&mut self, order: &OrderHandle) -> Result<(), VenueError> {
        if self.fail_cancel {
            return Err(VenueError::Unavailable {
                venue: "execution".to_string(),
            });
        }
        self.orders
            .remove(&order.order_id)
            .map(|_| ())
            .ok_or_else(|| VenueError::OrderNotFound {
                order_id: order.order_id.to_string(),
            })
    }
}
