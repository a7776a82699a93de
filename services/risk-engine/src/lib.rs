//! Risk Engine Service
//!
//! Gates every state-changing operation of the protocol: loan-to-value
//! bounds, price freshness and confidence, slippage tolerance, and
//! position-size limits, plus the capability-gated parameter store and
//! emergency pause switch.
//!
//! Each check is exposed both as a boolean predicate (`validate_*`) for
//! programmatic fallback and as an abort variant (`assert_*`) for
//! strict call sites. Every rejection, through either variant, appends
//! a structured failure record to the engine's append-only event log.

pub mod checks;
pub mod engine;
pub mod errors;
pub mod events;
pub mod params;

pub use engine::RiskEngine;
pub use errors::RiskError;
pub use params::RiskParameters;
