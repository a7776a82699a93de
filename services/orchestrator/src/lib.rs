//! Atomic Orchestrator
//!
//! Derives a hedge plan from a fresh oracle quote and composes the
//! four-step unit {attach price, lock collateral, draw debt, place
//! bounded hedge order} against external venues as one indivisible
//! operation. If any step is rejected the unit has no effect: no
//! collateral stays locked, no debt is recorded, no hedge is open.
//!
//! Atomicity is a saga: a write-ahead intent log records each step
//! before it runs, and on failure the confirmed steps are compensated
//! in reverse order. Ledger commits happen last, after every venue
//! step has succeeded.
//!
//! # Modules
//! - `plan`: Hedge plan derivation from a quote and a target LTV
//! - `venues`: Traits for the oracle, lending, and execution venues
//! - `intent`: Write-ahead intent log
//! - `orchestrator`: The saga driver
//! - `sim`: In-memory venues with fault injection, for testing
//! - `errors`: Orchestration error taxonomy

pub mod errors;
pub mod intent;
pub mod orchestrator;
pub mod plan;
pub mod sim;
pub mod venues;

pub use errors::OrchestratorError;
pub use orchestrator::{AtomicOrchestrator, OpenPosition};
pub use plan::HedgePlan;
