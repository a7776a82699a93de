//! The vault ledger record
//!
//! A `VaultLedger` is created once by its owner and persists
//! indefinitely; there is no deletion path. Field mutators are
//! crate-private so every change goes through the registry's guard
//! ordering, and each one advances `last_updated` monotonically.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{OwnerId, VaultId};
use types::scale;

use crate::errors::VaultError;

/// Per-owner record of collateral, debt, and hedge size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultLedger {
    vault_id: VaultId,
    owner: OwnerId,
    /// Collateral in collateral-asset minor units
    collateral_balance: u64,
    /// Outstanding debt in quote-asset minor units
    borrowed_amount: u64,
    /// Open short hedge in collateral-asset minor units
    hedge_position_size: u64,
    paused: bool,
    created_at: i64,
    last_updated: i64,
}

impl VaultLedger {
    pub(crate) fn new(vault_id: VaultId, owner: OwnerId, now: i64) -> Self {
        Self {
            vault_id,
            owner,
            collateral_balance: 0,
            borrowed_amount: 0,
            hedge_position_size: 0,
            paused: false,
            created_at: now,
            last_updated: now,
        }
    }

    // ───────────────────────── Reads ─────────────────────────

    pub fn vault_id(&self) -> VaultId {
        self.vault_id
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn collateral_balance(&self) -> u64 {
        self.collateral_balance
    }

    pub fn borrowed_amount(&self) -> u64 {
        self.borrowed_amount
    }

    pub fn hedge_position_size(&self) -> u64 {
        self.hedge_position_size
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn last_updated(&self) -> i64 {
        self.last_updated
    }

    /// Current loan-to-value in basis points at the given price, using
    /// the same floor-division rule the validators apply.
    pub fn current_ltv_bps(&self, price: Decimal) -> Result<u64, VaultError> {
        let collateral_value = scale::collateral_value_minor(self.collateral_balance, price)?;
        Ok(risk_engine::checks::ltv_bps(
            collateral_value,
            self.borrowed_amount,
        ))
    }

    // ───────────────────────── Mutators (crate-private) ─────────────────────────

    pub(crate) fn credit_collateral(&mut self, amount: u64, now: i64) -> Result<(), VaultError> {
        self.collateral_balance = self
            .collateral_balance
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;
        self.touch(now);
        Ok(())
    }

    pub(crate) fn debit_collateral(&mut self, amount: u64, now: i64) -> Result<(), VaultError> {
        if amount > self.collateral_balance {
            return Err(VaultError::InsufficientCollateral {
                requested: amount,
                available: self.collateral_balance,
            });
        }
        self.collateral_balance -= amount;
        self.touch(now);
        Ok(())
    }

    pub(crate) fn add_debt(&mut self, amount: u64, now: i64) -> Result<(), VaultError> {
        self.borrowed_amount = self
            .borrowed_amount
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;
        self.touch(now);
        Ok(())
    }

    pub(crate) fn reduce_debt(&mut self, amount: u64, now: i64) -> Result<(), VaultError> {
        if amount > self.borrowed_amount {
            return Err(VaultError::RepayExceedsDebt {
                requested: amount,
                outstanding: self.borrowed_amount,
            });
        }
        self.borrowed_amount -= amount;
        self.touch(now);
        Ok(())
    }

    pub(crate) fn open_hedge(&mut self, size: u64, now: i64) -> Result<(), VaultError> {
        self.hedge_position_size = self
            .hedge_position_size
            .checked_add(size)
            .ok_or(VaultError::Overflow)?;
        self.touch(now);
        Ok(())
    }

    /// Closing subtracts with saturation at zero: closing more than is
    /// currently open clamps rather than erroring, tolerating caller-side
    /// rounding noise on the close size.
    pub(crate) fn close_hedge_clamped(&mut self, size: u64, now: i64) {
        self.hedge_position_size = self.hedge_position_size.saturating_sub(size);
        self.touch(now);
    }

    pub(crate) fn set_paused(&mut self, paused: bool, now: i64) {
        self.paused = paused;
        self.touch(now);
    }

    fn touch(&mut self, now: i64) {
        // last_updated never moves backward, even with a lagging clock
        self.last_updated = self.last_updated.max(now);
    }
}
