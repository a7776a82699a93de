//! Vault registry — arena and access layer
//!
//! Vaults live in an arena addressed by `VaultId`. The registry
//! enforces the single-owner discipline: owner-gated mutations check
//! the acting party, pause/unpause require the admin capability, and
//! every mutation runs its risk-engine gate before any state commits.
//!
//! Guard ordering for mutations:
//! 1. Vault exists
//! 2. Owner check (where owner-gated)
//! 3. System pause (risk engine), then vault pause
//! 4. Amount validation
//! 5. Risk checks (LTV where debt is involved)
//! 6. Commit + event

use rust_decimal::Decimal;
use std::collections::HashMap;
use types::capability::AdminCapability;
use types::ids::{OwnerId, VaultId};
use types::scale;

use risk_engine::RiskEngine;

use crate::errors::VaultError;
use crate::events::{
    BorrowEvent, DepositEvent, HedgePositionEvent, RepayEvent, VaultEvent, VaultPauseEvent,
    WithdrawEvent,
};
use crate::ledger::VaultLedger;

/// Arena of vault ledgers with an append-only audit trail.
#[derive(Debug, Default)]
pub struct VaultRegistry {
    vaults: HashMap<VaultId, VaultLedger>,
    /// Emitted events log (append-only)
    events: Vec<VaultEvent>,
}

impl VaultRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            vaults: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Create a vault for `owner`. Vaults persist indefinitely.
    pub fn create(&mut self, owner: OwnerId, now: i64) -> VaultId {
        let vault_id = VaultId::new();
        self.vaults
            .insert(vault_id, VaultLedger::new(vault_id, owner, now));
        vault_id
    }

    // ───────────────────────── Reads ─────────────────────────

    /// Look up a vault by id.
    pub fn get(&self, vault_id: &VaultId) -> Result<&VaultLedger, VaultError> {
        self.vaults
            .get(vault_id)
            .ok_or_else(|| VaultError::VaultNotFound {
                vault_id: vault_id.to_string(),
            })
    }

    /// Current loan-to-value of a vault at the given price, in bps.
    pub fn current_ltv_bps(&self, vault_id: &VaultId, price: Decimal) -> Result<u64, VaultError> {
        self.get(vault_id)?.current_ltv_bps(price)
    }

    /// Number of vaults in the arena.
    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }

    // ───────────────────────── Mutations ─────────────────────────

    /// Deposit collateral. Any actor may top up a vault; the event
    /// records who did.
    pub fn deposit(
        &mut self,
        vault_id: &VaultId,
        actor: OwnerId,
        amount: u64,
        engine: &mut RiskEngine,
        now: i64,
    ) -> Result<(), VaultError> {
        self.get(vault_id)?;
        engine.assert_not_paused(now)?;
        self.check_vault_not_paused(vault_id)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        self.get_mut(vault_id)?.credit_collateral(amount, now)?;
        self.events.push(VaultEvent::Deposit(DepositEvent {
            vault_id: *vault_id,
            actor,
            amount,
            timestamp: now,
        }));
        Ok(())
    }

    /// Withdraw collateral. Owner-only. With outstanding debt, the
    /// post-withdrawal collateral is re-valued at `price` and the
    /// resulting LTV must pass the risk engine.
    pub fn withdraw(
        &mut self,
        vault_id: &VaultId,
        actor: OwnerId,
        amount: u64,
        price: Decimal,
        engine: &mut RiskEngine,
        now: i64,
    ) -> Result<(), VaultError> {
        let (collateral, borrowed) = {
            let ledger = self.get(vault_id)?;
            self.check_owner(ledger, actor)?;
            (ledger.collateral_balance(), ledger.borrowed_amount())
        };
        engine.assert_not_paused(now)?;
        self.check_vault_not_paused(vault_id)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if amount > collateral {
            return Err(VaultError::InsufficientCollateral {
                requested: amount,
                available: collateral,
            });
        }

        if borrowed > 0 {
            let post_value = scale::collateral_value_minor(collateral - amount, price)?;
            engine.assert_ltv(post_value, borrowed, now)?;
        }

        self.get_mut(vault_id)?.debit_collateral(amount, now)?;
        self.events.push(VaultEvent::Withdraw(WithdrawEvent {
            vault_id: *vault_id,
            actor,
            amount,
            timestamp: now,
        }));
        Ok(())
    }

    /// Record drawn debt. Owner-only. The resulting LTV at `price`
    /// must pass the risk engine before anything commits. Returns the
    /// resulting LTV in bps.
    pub fn record_borrow(
        &mut self,
        vault_id: &VaultId,
        actor: OwnerId,
        amount: u64,
        price: Decimal,
        engine: &mut RiskEngine,
        now: i64,
    ) -> Result<u64, VaultError> {
        let (collateral, borrowed) = {
            let ledger = self.get(vault_id)?;
            self.check_owner(ledger, actor)?;
            (ledger.collateral_balance(), ledger.borrowed_amount())
        };
        self.check_vault_not_paused(vault_id)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        let collateral_value = scale::collateral_value_minor(collateral, price)?;
        let new_borrowed = borrowed.checked_add(amount).ok_or(VaultError::Overflow)?;
        // Pause short-circuits inside the engine before the LTV check
        let ltv_bps = engine.assert_ltv(collateral_value, new_borrowed, now)?;

        self.get_mut(vault_id)?.add_debt(amount, now)?;
        self.events.push(VaultEvent::Borrow(BorrowEvent {
            vault_id: *vault_id,
            actor,
            amount,
            ltv_bps,
            timestamp: now,
        }));
        Ok(ltv_bps)
    }

    /// Record repaid debt. Owner-only. Rejects repaying more than owed.
    pub fn record_repay(
        &mut self,
        vault_id: &VaultId,
        actor: OwnerId,
        amount: u64,
        engine: &mut RiskEngine,
        now: i64,
    ) -> Result<(), VaultError> {
        {
            let ledger = self.get(vault_id)?;
            self.check_owner(ledger, actor)?;
        }
        engine.assert_not_paused(now)?;
        self.check_vault_not_paused(vault_id)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        self.get_mut(vault_id)?.reduce_debt(amount, now)?;
        self.events.push(VaultEvent::Repay(RepayEvent {
            vault_id: *vault_id,
            actor,
            amount,
            timestamp: now,
        }));
        Ok(())
    }

    /// Record a hedge open or close. Owner-only. Opening adds to the
    /// position; closing subtracts with saturation at zero.
    pub fn record_hedge(
        &mut self,
        vault_id: &VaultId,
        actor: OwnerId,
        size: u64,
        is_open: bool,
        engine: &mut RiskEngine,
        now: i64,
    ) -> Result<(), VaultError> {
        {
            let ledger = self.get(vault_id)?;
            self.check_owner(ledger, actor)?;
        }
        engine.assert_not_paused(now)?;
        self.check_vault_not_paused(vault_id)?;
        if size == 0 {
            return Err(VaultError::InvalidAmount);
        }

        let ledger = self.get_mut(vault_id)?;
        if is_open {
            ledger.open_hedge(size, now)?;
        } else {
            ledger.close_hedge_clamped(size, now);
        }
        self.events.push(VaultEvent::HedgePosition(HedgePositionEvent {
            vault_id: *vault_id,
            actor,
            size,
            is_open,
            timestamp: now,
        }));
        Ok(())
    }

    /// Pause a vault. Requires the admin capability, not the owner.
    pub fn pause(
        &mut self,
        vault_id: &VaultId,
        _cap: &AdminCapability,
        now: i64,
    ) -> Result<(), VaultError> {
        self.get_mut(vault_id)?.set_paused(true, now);
        self.events.push(VaultEvent::Pause(VaultPauseEvent {
            vault_id: *vault_id,
            paused: true,
            timestamp: now,
        }));
        Ok(())
    }

    /// Unpause a vault. Requires the admin capability.
    pub fn unpause(
        &mut self,
        vault_id: &VaultId,
        _cap: &AdminCapability,
        now: i64,
    ) -> Result<(), VaultError> {
        self.get_mut(vault_id)?.set_paused(false, now);
        self.events.push(VaultEvent::Pause(VaultPauseEvent {
            vault_id: *vault_id,
            paused: false,
            timestamp: now,
        }));
        Ok(())
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal Guards ─────────────────────────

    fn get_mut(&mut self, vault_id: &VaultId) -> Result<&mut VaultLedger, VaultError> {
        self.vaults
            .get_mut(vault_id)
            .ok_or_else(|| VaultError::VaultNotFound {
                vault_id: vault_id.to_string(),
            })
    }

    fn check_owner(&self, ledger: &VaultLedger, actor: OwnerId) -> Result<(), VaultError> {
        if ledger.owner() != actor {
            return Err(VaultError::NotOwner);
        }
        Ok(())
    }

    fn check_vault_not_paused(&self, vault_id: &VaultId) -> Result<(), VaultError> {
        if self.get(vault_id)?.is_paused() {
            return Err(VaultError::Paused);
        }
        Ok(())
    }
}
