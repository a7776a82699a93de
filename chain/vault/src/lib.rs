//! Vault Ledger
//!
//! Per-owner mutable record of collateral, debt, and hedge size, held
//! in an arena addressed by stable `VaultId`s. The registry is the
//! access layer: a vault is owned by exactly one actor, every
//! owner-gated mutation checks the caller, and every mutation is gated
//! by the risk engine and appended to the audit trail.
//!
//! # Modules
//! - `ledger`: The `VaultLedger` record and its invariant-preserving mutators
//! - `registry`: Arena, owner checks, risk gating, event emission
//! - `events`: Typed append-only audit events
//! - `errors`: Ledger error taxonomy

pub mod errors;
pub mod events;
pub mod ledger;
pub mod registry;

pub use errors::VaultError;
pub use ledger::VaultLedger;
pub use registry::VaultRegistry;
