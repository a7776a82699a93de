//! Types library for the delta-neutral vault protocol
//!
//! This library provides the core type definitions shared by the risk
//! engine, vault ledger, and orchestrator crates: identifiers, the
//! oracle price quote, numeric scale conversion, and the admin
//! capability token.
//!
//! # Modules
//! - `ids`: Unique identifiers (VaultId, OwnerId, OrderId, DebtId, ReceiptId)
//! - `quote`: Oracle price quote with exponent-scaled decimal view
//! - `scale`: Minor-unit fixed-point conversion helpers
//! - `capability`: Unforgeable admin capability token

pub mod capability;
pub mod ids;
pub mod quote;
pub mod scale;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::capability::*;
    pub use crate::ids::*;
    pub use crate::quote::*;
    pub use crate::scale::*;
}
