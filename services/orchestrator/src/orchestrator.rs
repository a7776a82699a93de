//! The saga driver
//!
//! Composes {attach price, lock collateral, draw debt, place hedge}
//! into one indivisible unit against the three venues. Steps run
//! strictly in order because each consumes the previous step's output:
//! the attested price feeds the plan, the custody receipt backs the
//! borrow, the drawn amount sizes the hedge order.
//!
//! Every step is written to the intent log before it executes. On a
//! step failure the confirmed steps are compensated in reverse order
//! (cancel order, repay debt, unlock collateral), so the vault ledger
//! and the venues end exactly where they started. Ledger commits run
//! last, after every venue step has succeeded.

use rust_decimal::Decimal;
use tracing::{info, warn};
use types::ids::{FeedId, OwnerId, VaultId};

use risk_engine::RiskEngine;
use vault::VaultRegistry;

use crate::errors::OrchestratorError;
use crate::intent::{IntentLog, IntentRecord, Step};
use crate::plan::{self, HedgePlan};
use crate::venues::{
    CustodyReceipt, DebtHandle, ExecutionVenue, LendingVenue, OrderHandle, PriceOracle,
};

/// Resting-order lifetime handed to the execution venue.
const ORDER_TTL_SECONDS: i64 = 300;

/// A settled hedge position: the plan that produced it plus the venue
/// handles needed to close it.
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub vault_id: VaultId,
    pub plan: HedgePlan,
    pub receipt: CustodyReceipt,
    pub debt: DebtHandle,
    pub order: OrderHandle,
    /// LTV recorded at commit, bps
    pub ltv_bps: u64,
    /// Intent log of the open saga, in execution order
    pub intent: Vec<IntentRecord>,
}

/// Drives the all-or-nothing open and close sagas.
#[derive(Debug)]
pub struct AtomicOrchestrator<O, L, E> {
    oracle: O,
    lending: L,
    execution: E,
    feed: FeedId,
}

impl<O: PriceOracle, L: LendingVenue, E: ExecutionVenue> AtomicOrchestrator<O, L, E> {
    pub fn new(oracle: O, lending: L, execution: E, feed: FeedId) -> Self {
        Self {
            oracle,
            lending,
            execution,
            feed,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn lending(&self) -> &L {
        &self.lending
    }

    pub fn execution(&self) -> &E {
        &self.execution
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn lending_mut(&mut self) -> &mut L {
        &mut self.lending
    }

    pub fn execution_mut(&mut self) -> &mut E {
        &mut self.execution
    }

    /// Open a hedged position as one indivisible unit.
    ///
    /// `expected_price` is the caller's price hint; the fresh quote
    /// must sit within the slippage tolerance of it. `target_ltv_bps`
    /// is the fraction of collateral value to borrow. On any failure
    /// the vault ledger and all venues are restored to their
    /// pre-attempt state.
    #[allow(clippy::too_many_arguments)]
    pub fn open_hedged_position(
        &mut self,
        registry: &mut VaultRegistry,
        engine: &mut RiskEngine,
        vault_id: VaultId,
        owner: OwnerId,
        collateral_amount: u64,
        expected_price: Decimal,
        target_ltv_bps: u64,
        slippage_bps: u64,
        now: i64,
    ) -> Result<OpenPosition, OrchestratorError> {
        let mut log = IntentLog::new();

        info!(
            vault_id = %vault_id,
            collateral_amount,
            target_ltv_bps,
            "Opening hedged position"
        );

        // Step 1: attach and verify the price attestation
        let attach_idx = log.begin(Step::AttachPrice, now);
        let quote = match self.oracle.get_quote(&self.feed) {
            Ok(q) => q,
            Err(e) => {
                log.fail(attach_idx, now);
                return Err(OrchestratorError::venue(Step::AttachPrice, e));
            }
        };
        if let Err(e) = engine.assert_price(&quote, now) {
            log.fail(attach_idx, now);
            return Err(e.into());
        }
        let price = quote.price_decimal();
        if let Err(e) = engine.assert_slippage(expected_price, price, now) {
            log.fail(attach_idx, now);
            return Err(e.into());
        }
        log.confirm(attach_idx, now);

        // Derivation and pre-validation: nothing external has run yet,
        // so any rejection here is free of side effects.
        let plan = HedgePlan::derive(collateral_amount, price, target_ltv_bps, slippage_bps)?;
        engine.assert_ltv(plan.collateral_value, plan.borrow_amount, now)?;
        engine.assert_position_size(plan.hedge_size, now)?;

        let minimum = self.execution.min_order_size();
        if plan.hedge_size < minimum {
            // Never a partial hedge
            return Err(OrchestratorError::BelowMinimumOrder {
                hedge_size: plan.hedge_size,
                minimum,
            });
        }

        let ledger = registry.get(&vault_id)?;
        if ledger.owner() != owner {
            return Err(vault::VaultError::NotOwner.into());
        }
        if ledger.collateral_balance() < collateral_amount {
            return Err(OrchestratorError::InsufficientCollateral {
                requested: collateral_amount,
                available: ledger.collateral_balance(),
            });
        }

        // Step 2: lock collateral with the custody venue
        let lock_idx = log.begin(Step::LockCollateral, now);
        let receipt = match self.lending.lock_collateral(collateral_amount) {
            Ok(r) => r,
            Err(e) => {
                log.fail(lock_idx, now);
                return Err(OrchestratorError::venue(Step::LockCollateral, e));
            }
        };
        log.confirm(lock_idx, now);

        // Step 3: draw debt against the receipt
        let draw_idx = log.begin(Step::DrawDebt, now);
        let debt = match self.lending.borrow(&receipt, plan.borrow_amount) {
            Ok(d) => d,
            Err(e) => {
                log.fail(draw_idx, now);
                self.unwind_open(&mut log, now, None, None, Some((&receipt, lock_idx)))?;
                return Err(OrchestratorError::venue(Step::DrawDebt, e));
            }
        };
        log.confirm(draw_idx, now);

        // Step 4: place the bounded-price short hedge
        let place_idx = log.begin(Step::PlaceHedge, now);
        let order = match self.execution.place_limit_order(
            &self.feed,
            false,
            plan.limit_price,
            plan.hedge_size,
            now + ORDER_TTL_SECONDS,
        ) {
            Ok(o) => o,
            Err(e) => {
                log.fail(place_idx, now);
                self.unwind_open(
                    &mut log,
                    now,
                    None,
                    Some((&debt, draw_idx)),
                    Some((&receipt, lock_idx)),
                )?;
                return Err(OrchestratorError::venue(Step::PlaceHedge, e));
            }
        };
        log.confirm(place_idx, now);

        // Commit to the ledger only after every venue step succeeded
        let commit_idx = log.begin(Step::CommitLedger, now);
        let ltv_bps = match registry.record_borrow(
            &vault_id,
            owner,
            plan.borrow_amount,
            plan.reference_price,
            engine,
            now,
        ) {
            Ok(ltv) => ltv,
            Err(e) => {
                log.fail(commit_idx, now);
                self.unwind_open(
                    &mut log,
                    now,
                    Some((&order, place_idx)),
                    Some((&debt, draw_idx)),
                    Some((&receipt, lock_idx)),
                )?;
                return Err(e.into());
            }
        };
        if let Err(e) = registry.record_hedge(&vault_id, owner, plan.hedge_size, true, engine, now)
        {
            log.fail(commit_idx, now);
            // Reverse the borrow just recorded before unwinding venues
            if let Err(revert) = registry.record_repay(&vault_id, owner, plan.borrow_amount, engine, now)
            {
                return Err(OrchestratorError::CompensationFailed {
                    step: Step::CommitLedger,
                    detail: revert.to_string(),
                });
            }
            self.unwind_open(
                &mut log,
                now,
                Some((&order, place_idx)),
                Some((&debt, draw_idx)),
                Some((&receipt, lock_idx)),
            )?;
            return Err(e.into());
        }
        log.confirm(commit_idx, now);

        info!(
            vault_id = %vault_id,
            borrow_amount = plan.borrow_amount,
            hedge_size = plan.hedge_size,
            ltv_bps,
            "Hedged position opened"
        );

        Ok(OpenPosition {
            vault_id,
            plan,
            receipt,
            debt,
            order,
            ltv_bps,
            intent: log.records().to_vec(),
        })
    }

    /// Close a hedged position as one indivisible unit: buy back the
    /// hedge at a bounded price, repay the debt, release the custody
    /// lock, then reflect all of it in the ledger.
    pub fn close_hedged_position(
        &mut self,
        registry: &mut VaultRegistry,
        engine: &mut RiskEngine,
        position: &OpenPosition,
        owner: OwnerId,
        now: i64,
    ) -> Result<(), OrchestratorError> {
        let mut log = IntentLog::new();
        let plan = &position.plan;
        let vault_id = position.vault_id;

        info!(vault_id = %vault_id, hedge_size = plan.hedge_size, "Closing hedged position");

        // Pre-validate everything the ledger commit will check, so the
        // commit cannot fail after the venue steps have run. The
        // exclusive borrows on `registry` and `engine` hold for the
        // whole call, so nothing can invalidate these checks mid-saga.
        let ledger = registry.get(&vault_id)?;
        if ledger.owner() != owner {
            return Err(vault::VaultError::NotOwner.into());
        }
        if ledger.hedge_position_size() == 0 {
            return Err(OrchestratorError::NothingToClose);
        }
        if ledger.is_paused() {
            return Err(vault::VaultError::Paused.into());
        }
        if ledger.borrowed_amount() < plan.borrow_amount {
            return Err(vault::VaultError::RepayExceedsDebt {
                requested: plan.borrow_amount,
                outstanding: ledger.borrowed_amount(),
            }
            .into());
        }
        engine.assert_not_paused(now)?;

        // Step 1: fresh price for the cover leg
        let attach_idx = log.begin(Step::AttachPrice, now);
        let quote = match self.oracle.get_quote(&self.feed) {
            Ok(q) => q,
            Err(e) => {
                log.fail(attach_idx, now);
                return Err(OrchestratorError::venue(Step::AttachPrice, e));
            }
        };
        if let Err(e) = engine.assert_price(&quote, now) {
            log.fail(attach_idx, now);
            return Err(e.into());
        }
        let price = quote.price_decimal();
        let cover_limit = plan::buy_limit_price(price, plan.slippage_bps)?;
        log.confirm(attach_idx, now);

        // Step 2: cover/buy back the hedge
        let cover_idx = log.begin(Step::PlaceCover, now);
        let cover_order = match self.execution.place_limit_order(
            &self.feed,
            true,
            cover_limit,
            plan.hedge_size,
            now + ORDER_TTL_SECONDS,
        ) {
            Ok(o) => o,
            Err(e) => {
                log.fail(cover_idx, now);
                return Err(OrchestratorError::venue(Step::PlaceCover, e));
            }
        };
        log.confirm(cover_idx, now);

        // Step 3: repay the drawn debt
        let repay_idx = log.begin(Step::RepayDebt, now);
        if let Err(e) = self.lending.repay(&position.debt) {
            log.fail(repay_idx, now);
            self.cancel_with_log(&mut log, &cover_order, cover_idx, Step::PlaceCover, now)?;
            return Err(OrchestratorError::venue(Step::RepayDebt, e));
        }
        log.confirm(repay_idx, now);

        // Step 4: release the custody lock
        let release_idx = log.begin(Step::ReleaseCollateral, now);
        if let Err(e) = self.lending.unlock_collateral(&position.receipt) {
            log.fail(release_idx, now);
            // Re-draw the repaid debt, then drop the cover order
            match self.lending.borrow(&position.receipt, plan.borrow_amount) {
                Ok(_) => log.compensate(repay_idx, now),
                Err(revert) => {
                    return Err(OrchestratorError::compensation(Step::RepayDebt, &revert))
                }
            }
            self.cancel_with_log(&mut log, &cover_order, cover_idx, Step::PlaceCover, now)?;
            return Err(OrchestratorError::venue(Step::ReleaseCollateral, e));
        }
        log.confirm(release_idx, now);

        // Ledger commit: close the hedge, clear the debt. The
        // pre-validation above makes a failure here unreachable while
        // the exclusive borrows hold, but a failure still unwinds the
        // venue steps so the position stays intact on both sides.
        let commit_idx = log.begin(Step::CommitLedger, now);
        if let Err(e) = registry.record_hedge(&vault_id, owner, plan.hedge_size, false, engine, now)
        {
            log.fail(commit_idx, now);
            self.unwind_close(&mut log, now, &cover_order, cover_idx, repay_idx, release_idx, plan)?;
            return Err(e.into());
        }
        if let Err(e) = registry.record_repay(&vault_id, owner, plan.borrow_amount, engine, now) {
            log.fail(commit_idx, now);
            // Restore the hedge record so the ledger stays consistent
            if let Err(revert) =
                registry.record_hedge(&vault_id, owner, plan.hedge_size, true, engine, now)
            {
                return Err(OrchestratorError::CompensationFailed {
                    step: Step::CommitLedger,
                    detail: revert.to_string(),
                });
            }
            self.unwind_close(&mut log, now, &cover_order, cover_idx, repay_idx, release_idx, plan)?;
            return Err(e.into());
        }
        log.confirm(commit_idx, now);

        info!(vault_id = %vault_id, "Hedged position closed");
        Ok(())
    }

    /// Undo confirmed open-saga steps in reverse order. The first
    /// compensation that itself fails aborts with `CompensationFailed`;
    /// everything before it is marked compensated in the log.
    fn unwind_open(
        &mut self,
        log: &mut IntentLog,
        now: i64,
        order: Option<(&OrderHandle, usize)>,
        debt: Option<(&DebtHandle, usize)>,
        receipt: Option<(&CustodyReceipt, usize)>,
    ) -> Result<(), OrchestratorError> {
        if let Some((order, idx)) = order {
            self.cancel_with_log(log, order, idx, Step::PlaceHedge, now)?;
        }
        if let Some((debt, idx)) = debt {
            self.lending
                .repay(debt)
                .map_err(|e| OrchestratorError::compensation(Step::DrawDebt, &e))?;
            log.compensate(idx, now);
            warn!(debt_id = %debt.debt_id, "Repaid drawn debt during unwind");
        }
        if let Some((receipt, idx)) = receipt {
            self.lending
                .unlock_collateral(receipt)
                .map_err(|e| OrchestratorError::compensation(Step::LockCollateral, &e))?;
            log.compensate(idx, now);
            warn!(receipt_id = %receipt.receipt_id, "Released collateral lock during unwind");
        }
        Ok(())
    }

    /// Undo the close saga's venue steps after they all ran:
    /// re-establish the custody lock, draw the debt back, and drop the
    /// cover order, in reverse step order. Fresh venue handles are not
    /// surfaced; a position whose close aborted here must be
    /// reconciled before retrying.
    #[allow(clippy::too_many_arguments)]
    fn unwind_close(
        &mut self,
        log: &mut IntentLog,
        now: i64,
        cover_order: &OrderHandle,
        cover_idx: usize,
        repay_idx: usize,
        release_idx: usize,
        plan: &HedgePlan,
    ) -> Result<(), OrchestratorError> {
        let receipt = self
            .lending
            .lock_collateral(plan.collateral_amount)
            .map_err(|e| OrchestratorError::compensation(Step::ReleaseCollateral, &e))?;
        log.compensate(release_idx, now);
        warn!(receipt_id = %receipt.receipt_id, "Re-locked collateral during unwind");
        let debt = self
            .lending
            .borrow(&receipt, plan.borrow_amount)
            .map_err(|e| OrchestratorError::compensation(Step::RepayDebt, &e))?;
        log.compensate(repay_idx, now);
        warn!(debt_id = %debt.debt_id, "Re-drew repaid debt during unwind");
        self.cancel_with_log(log, cover_order, cover_idx, Step::PlaceCover, now)?;
        Ok(())
    }

    fn cancel_with_log(
        &mut self,
        log: &mut IntentLog,
        order: &OrderHandle,
        idx: usize,
        step: Step,
        now: i64,
    ) -> Result<(), OrchestratorError> {
        self.execution
            .cancel_order(order)
            .map_err(|e| OrchestratorError::compensation(step, &e))?;
        log.compensate(idx, now);
        warn!(order_id = %order.order_id, "Cancelled resting order during unwind");
        Ok(())
    }
}
