//! Atomicity tests for the hedge orchestration saga
//!
//! The central contract: the four-step unit {attach price, lock
//! collateral, draw debt, place hedge} either fully commits or has no
//! effect. These tests inject a fault at each step via the simulated
//! venues and assert that the vault ledger and every venue end in
//! their pre-attempt state.

use orchestrator::errors::OrchestratorError;
use orchestrator::intent::Step;
use orchestrator::orchestrator::{AtomicOrchestrator, OpenPosition};
use orchestrator::sim::{SimExecutionVenue, SimLendingVenue, SimOracle};
use risk_engine::{RiskEngine, RiskError};
use rust_decimal::Decimal;
use types::capability::{AdminCapability, CapabilityAuthority};
use types::ids::{FeedId, OwnerId, VaultId};
use types::quote::PriceQuote;
use vault::VaultRegistry;

const NOW: i64 = 1_700_000_000;
const COLLATERAL: u64 = 100_000_000_000; // 100 tokens at 9 decimals
const TARGET_LTV_BPS: u64 = 6_400;
const SLIPPAGE_BPS: u64 = 50;
const EXPECTED_BORROW: u64 = 224_000_000; // 224 quote units at 6 decimals
const EXPECTED_HEDGE: u64 = 64_000_000_000; // 64 tokens at 9 decimals

type SimOrchestrator = AtomicOrchestrator<SimOracle, SimLendingVenue, SimExecutionVenue>;

// ═══════════════════════════════════════════════════════════════════
// Happy path
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_open_commits_all_four_steps() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();

    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();

    assert_eq!(position.ltv_bps, TARGET_LTV_BPS);
    assert_eq!(position.plan.borrow_amount, EXPECTED_BORROW);
    assert_eq!(position.plan.hedge_size, EXPECTED_HEDGE);

    let ledger = registry.get(&vault_id).unwrap();
    assert_eq!(ledger.collateral_balance(), COLLATERAL);
    assert_eq!(ledger.borrowed_amount(), EXPECTED_BORROW);
    assert_eq!(ledger.hedge_position_size(), EXPECTED_HEDGE);

    assert_eq!(orch.lending().locked_total(), COLLATERAL);
    assert_eq!(orch.lending().outstanding_debt(), EXPECTED_BORROW);
    assert_eq!(orch.execution().open_order_count(), 1);
}

#[test]
fn test_open_intent_log_fully_confirmed() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();

    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();

    let steps: Vec<Step> = position.intent.iter().map(|r| r.step).collect();
    assert_eq!(
        steps,
        vec![
            Step::AttachPrice,
            Step::LockCollateral,
            Step::DrawDebt,
            Step::PlaceHedge,
            Step::CommitLedger,
        ]
    );
    assert!(position
        .intent
        .iter()
        .all(|r| r.status == orchestrator::intent::StepStatus::Confirmed));
}

#[test]
fn test_residual_exposure_is_unhedged_fraction() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();
    // 36 of 100 tokens stay unhedged with a 64% target
    assert_eq!(position.plan.residual_exposure(), 36_000_000_000);
}

// ═══════════════════════════════════════════════════════════════════
// Fault injection: one step fails, the unit has no effect
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_lock_failure_leaves_no_trace() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    orch.lending_mut().fail_lock = true;

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Venue {
            step: Step::LockCollateral,
            ..
        }
    ));
    assert_vault_untouched(&registry, &vault_id);
    assert_venues_untouched(&orch);
}

#[test]
fn test_borrow_failure_releases_lock() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    orch.lending_mut().fail_borrow = true;

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Venue {
            step: Step::DrawDebt,
            ..
        }
    ));
    assert_vault_untouched(&registry, &vault_id);
    assert_venues_untouched(&orch);
}

#[test]
fn test_place_failure_repays_and_releases() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    orch.execution_mut().fail_place = true;

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Venue {
            step: Step::PlaceHedge,
            ..
        }
    ));
    assert_vault_untouched(&registry, &vault_id);
    assert_venues_untouched(&orch);
}

#[test]
fn test_insufficient_lending_liquidity_rolls_back() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    // Pool smaller than the 224-unit borrow
    *orch.lending_mut() = SimLendingVenue::new(100_000_000);

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Venue {
            step: Step::DrawDebt,
            ..
        }
    ));
    assert_vault_untouched(&registry, &vault_id);
    assert_eq!(orch.lending().locked_total(), 0);
}

#[test]
fn test_failed_compensation_is_reported() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    orch.lending_mut().fail_borrow = true;
    orch.lending_mut().fail_unlock = true;

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();

    // Borrow failed and the unlock compensation also failed: the
    // collateral lock is stranded and the error says so.
    assert!(matches!(
        err,
        OrchestratorError::CompensationFailed {
            step: Step::LockCollateral,
            ..
        }
    ));
    assert_vault_untouched(&registry, &vault_id);
}

// ═══════════════════════════════════════════════════════════════════
// Pre-validation rejections: no venue call at all
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_below_minimum_order_rejects_whole_plan() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    *orch.execution_mut() = SimExecutionVenue::new(EXPECTED_HEDGE + 1);

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();

    assert!(matches!(err, OrchestratorError::BelowMinimumOrder { .. }));
    assert_vault_untouched(&registry, &vault_id);
    assert_venues_untouched(&orch);
}

#[test]
fn test_stale_quote_rejected_before_any_step() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    orch.oracle_mut()
        .set_quote(feed(), PriceQuote::new(350_000_000, 1_000_000, -8, NOW - 120));

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Risk(RiskError::StalePrice { .. })
    ));
    assert_venues_untouched(&orch);
}

#[test]
fn test_wide_confidence_rejected() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    // 3.5 ± 0.105 is 300 bps, over the 200 bps ceiling
    orch.oracle_mut()
        .set_quote(feed(), PriceQuote::new(350_000_000, 10_500_000, -8, NOW - 5));

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Risk(RiskError::ConfidenceTooWide { .. })
    ));
}

#[test]
fn test_quote_drift_from_expected_price_rejected() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();

    // Caller expected 3.60; the oracle says 3.50 — 277 bps of drift
    let expected = Decimal::from_str_exact("3.60").unwrap();
    let err = orch
        .open_hedged_position(
            &mut registry,
            &mut engine,
            vault_id,
            owner,
            COLLATERAL,
            expected,
            TARGET_LTV_BPS,
            SLIPPAGE_BPS,
            NOW,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Risk(RiskError::SlippageExceeded { .. })
    ));
    assert_venues_untouched(&orch);
}

#[test]
fn test_target_above_ltv_ceiling_rejected() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();

    let err = orch
        .open_hedged_position(
            &mut registry,
            &mut engine,
            vault_id,
            owner,
            COLLATERAL,
            price(),
            8_000, // over the 7500 bps default ceiling
            SLIPPAGE_BPS,
            NOW,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Risk(RiskError::LtvExceeded { .. })
    ));
    assert_venues_untouched(&orch);
}

#[test]
fn test_position_size_ceiling_rejected() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let cap = admin();
    engine.update_params(
        &cap,
        risk_engine::RiskParameters {
            max_position_size: EXPECTED_HEDGE - 1,
            ..risk_engine::RiskParameters::default()
        },
        NOW,
    );

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Risk(RiskError::PositionTooLarge { .. })
    ));
    assert_venues_untouched(&orch);
}

#[test]
fn test_paused_system_rejects_open() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let cap = admin();
    engine.pause(&cap, "oracle outage", NOW);

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap_err();
    assert!(matches!(err, OrchestratorError::Risk(RiskError::Paused)));
    assert_venues_untouched(&orch);
}

#[test]
fn test_insufficient_vault_collateral_rejected() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();

    let err = orch
        .open_hedged_position(
            &mut registry,
            &mut engine,
            vault_id,
            owner,
            COLLATERAL * 2,
            price(),
            TARGET_LTV_BPS,
            SLIPPAGE_BPS,
            NOW,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::InsufficientCollateral { .. }
    ));
    assert_venues_untouched(&orch);
}

#[test]
fn test_non_owner_cannot_open() {
    let (mut orch, mut registry, mut engine, vault_id, _owner) = setup();
    let eve = OwnerId::new();

    let err = open(&mut orch, &mut registry, &mut engine, vault_id, eve).unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Vault(vault::VaultError::NotOwner)
    ));
    assert_venues_untouched(&orch);
}

#[test]
fn test_rejection_records_risk_event() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    orch.oracle_mut()
        .set_quote(feed(), PriceQuote::new(350_000_000, 1_000_000, -8, NOW - 120));

    let _ = open(&mut orch, &mut registry, &mut engine, vault_id, owner);

    assert!(engine.events().iter().any(|e| matches!(
        e.event_type,
        risk_engine::events::RiskEventType::CheckFailed { .. }
    )));
}

// ═══════════════════════════════════════════════════════════════════
// Close saga
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_close_unwinds_position_fully() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();

    orch.close_hedged_position(&mut registry, &mut engine, &position, owner, NOW + 30)
        .unwrap();

    let ledger = registry.get(&vault_id).unwrap();
    assert_eq!(ledger.collateral_balance(), COLLATERAL);
    assert_eq!(ledger.borrowed_amount(), 0);
    assert_eq!(ledger.hedge_position_size(), 0);

    assert_eq!(orch.lending().locked_total(), 0);
    assert_eq!(orch.lending().outstanding_debt(), 0);
}

#[test]
fn test_close_repay_failure_cancels_cover_order() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();
    let orders_before = orch.execution().open_order_count();
    orch.lending_mut().fail_repay = true;

    let err = orch
        .close_hedged_position(&mut registry, &mut engine, &position, owner, NOW + 30)
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Venue {
            step: Step::RepayDebt,
            ..
        }
    ));
    // Position state is intact: ledger unchanged, cover order cancelled
    let ledger = registry.get(&vault_id).unwrap();
    assert_eq!(ledger.borrowed_amount(), EXPECTED_BORROW);
    assert_eq!(ledger.hedge_position_size(), EXPECTED_HEDGE);
    assert_eq!(orch.execution().open_order_count(), orders_before);
    assert_eq!(orch.lending().outstanding_debt(), EXPECTED_BORROW);
}

#[test]
fn test_close_without_open_hedge_rejected() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();
    orch.close_hedged_position(&mut registry, &mut engine, &position, owner, NOW + 30)
        .unwrap();

    let err = orch
        .close_hedged_position(&mut registry, &mut engine, &position, owner, NOW + 40)
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NothingToClose));
}

#[test]
fn test_close_by_non_owner_rejected() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();
    let eve = OwnerId::new();

    let err = orch
        .close_hedged_position(&mut registry, &mut engine, &position, eve, NOW + 30)
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Vault(vault::VaultError::NotOwner)
    ));
}

#[test]
fn test_close_on_paused_vault_leaves_position_intact() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();
    let cap = admin();
    registry.pause(&vault_id, &cap, NOW + 10).unwrap();

    let err = orch
        .close_hedged_position(&mut registry, &mut engine, &position, owner, NOW + 30)
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Vault(vault::VaultError::Paused)
    ));
    // Rejected before any venue step: the position is intact on both
    // sides, ledger and venues agree
    let ledger = registry.get(&vault_id).unwrap();
    assert_eq!(ledger.borrowed_amount(), EXPECTED_BORROW);
    assert_eq!(ledger.hedge_position_size(), EXPECTED_HEDGE);
    assert_eq!(orch.lending().locked_total(), COLLATERAL);
    assert_eq!(orch.lending().outstanding_debt(), EXPECTED_BORROW);
    assert_eq!(orch.execution().open_order_count(), 1);
}

#[test]
fn test_close_on_paused_system_leaves_position_intact() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();
    let cap = admin();
    engine.pause(&cap, "halt", NOW + 10);

    let err = orch
        .close_hedged_position(&mut registry, &mut engine, &position, owner, NOW + 30)
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::Risk(RiskError::Paused)));
    let ledger = registry.get(&vault_id).unwrap();
    assert_eq!(ledger.borrowed_amount(), EXPECTED_BORROW);
    assert_eq!(ledger.hedge_position_size(), EXPECTED_HEDGE);
    assert_eq!(orch.lending().locked_total(), COLLATERAL);
    assert_eq!(orch.lending().outstanding_debt(), EXPECTED_BORROW);
}

#[test]
fn test_close_after_partial_repay_rejected_before_venue_steps() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();
    // Owner pays down part of the debt out of band
    registry
        .record_repay(&vault_id, owner, 24_000_000, &mut engine, NOW + 10)
        .unwrap();

    let err = orch
        .close_hedged_position(&mut registry, &mut engine, &position, owner, NOW + 30)
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Vault(vault::VaultError::RepayExceedsDebt { .. })
    ));
    // Venue state untouched by the rejected close
    assert_eq!(orch.lending().locked_total(), COLLATERAL);
    assert_eq!(orch.lending().outstanding_debt(), EXPECTED_BORROW);
    assert_eq!(orch.execution().open_order_count(), 1);
    assert_eq!(
        registry.get(&vault_id).unwrap().borrowed_amount(),
        EXPECTED_BORROW - 24_000_000
    );
}

#[test]
fn test_failed_cover_cancel_names_cover_step() {
    let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
    let position = open(&mut orch, &mut registry, &mut engine, vault_id, owner).unwrap();
    orch.lending_mut().fail_repay = true;
    orch.execution_mut().fail_cancel = true;

    let err = orch
        .close_hedged_position(&mut registry, &mut engine, &position, owner, NOW + 30)
        .unwrap_err();

    // Repay failed, then the cover-order cancel failed too: the report
    // points at the cover leg, not the open saga's hedge leg
    assert!(matches!(
        err,
        OrchestratorError::CompensationFailed {
            step: Step::PlaceCover,
            ..
        }
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz: any single-step fault leaves no partial state
// ═══════════════════════════════════════════════════════════════════

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fuzz_open_is_all_or_nothing(
            fail_lock in any::<bool>(),
            fail_borrow in any::<bool>(),
            fail_place in any::<bool>(),
            target_bps in 1_000u64..7_500u64,
        ) {
            let (mut orch, mut registry, mut engine, vault_id, owner) = setup();
            orch.lending_mut().fail_lock = fail_lock;
            orch.lending_mut().fail_borrow = fail_borrow;
            orch.execution_mut().fail_place = fail_place;

            let result = orch.open_hedged_position(
                &mut registry,
                &mut engine,
                vault_id,
                owner,
                COLLATERAL,
                price(),
                target_bps,
                SLIPPAGE_BPS,
                NOW,
            );

            let ledger = registry.get(&vault_id).unwrap();
            match result {
                Ok(position) => {
                    prop_assert_eq!(ledger.borrowed_amount(), position.plan.borrow_amount);
                    prop_assert_eq!(ledger.hedge_position_size(), position.plan.hedge_size);
                    prop_assert_eq!(orch.lending().locked_total(), COLLATERAL);
                }
                Err(_) => {
                    prop_assert_eq!(ledger.collateral_balance(), COLLATERAL);
                    prop_assert_eq!(ledger.borrowed_amount(), 0);
                    prop_assert_eq!(ledger.hedge_position_size(), 0);
                    prop_assert_eq!(orch.lending().locked_total(), 0);
                    prop_assert_eq!(orch.lending().outstanding_debt(), 0);
                    prop_assert_eq!(orch.execution().open_order_count(), 0);
                }
            }
        }

        #[test]
        fn fuzz_open_close_round_trip(target_bps in 1_000u64..7_500u64) {
            let (mut orch, mut registry, mut engine, vault_id, owner) = setup();

            let position = orch.open_hedged_position(
                &mut registry,
                &mut engine,
                vault_id,
                owner,
                COLLATERAL,
                price(),
                target_bps,
                SLIPPAGE_BPS,
                NOW,
            ).unwrap();
            orch.close_hedged_position(
                &mut registry, &mut engine, &position, owner, NOW + 30,
            ).unwrap();

            let ledger = registry.get(&vault_id).unwrap();
            prop_assert_eq!(ledger.collateral_balance(), COLLATERAL);
            prop_assert_eq!(ledger.borrowed_amount(), 0);
            prop_assert_eq!(ledger.hedge_position_size(), 0);
            prop_assert_eq!(orch.lending().locked_total(), 0);
            prop_assert_eq!(orch.lending().outstanding_debt(), 0);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn feed() -> FeedId {
    FeedId::new("TKN/USD")
}

fn price() -> Decimal {
    Decimal::from_str_exact("3.5").unwrap()
}

fn admin() -> AdminCapability {
    CapabilityAuthority::new().bootstrap().unwrap()
}

fn setup() -> (SimOrchestrator, VaultRegistry, RiskEngine, VaultId, OwnerId) {
    let mut oracle = SimOracle::new();
    // 3.5 ± 0.01, published 5s ago
    oracle.set_quote(feed(), PriceQuote::new(350_000_000, 1_000_000, -8, NOW - 5));
    let lending = SimLendingVenue::new(1_000_000_000_000);
    let execution = SimExecutionVenue::new(1_000_000);
    let orch = AtomicOrchestrator::new(oracle, lending, execution, feed());

    let mut registry = VaultRegistry::new();
    let mut engine = RiskEngine::new(NOW);
    let owner = OwnerId::new();
    let vault_id = registry.create(owner, NOW);
    registry
        .deposit(&vault_id, owner, COLLATERAL, &mut engine, NOW)
        .unwrap();

    (orch, registry, engine, vault_id, owner)
}

fn open(
    orch: &mut SimOrchestrator,
    registry: &mut VaultRegistry,
    engine: &mut RiskEngine,
    vault_id: VaultId,
    owner: OwnerId,
) -> Result<OpenPosition, OrchestratorError> {
    orch.open_hedged_position(
        registry,
        engine,
        vault_id,
        owner,
        COLLATERAL,
        price(),
        TARGET_LTV_BPS,
        SLIPPAGE_BPS,
        NOW,
    )
}

fn assert_vault_untouched(registry: &VaultRegistry, vault_id: &VaultId) {
    let ledger = registry.get(vault_id).unwrap();
    assert_eq!(ledger.collateral_balance(), COLLATERAL);
    assert_eq!(ledger.borrowed_amount(), 0);
    assert_eq!(ledger.hedge_position_size(), 0);
}

fn assert_venues_untouched(orch: &SimOrchestrator) {
    assert_eq!(orch.lending().locked_total(), 0);
    assert_eq!(orch.lending().outstanding_debt(), 0);
    assert_eq!(orch.execution().open_order_count(), 0);
}
