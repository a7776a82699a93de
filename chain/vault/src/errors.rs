//! Vault-specific error types
//!
//! Authorization failures (`NotOwner`, `VaultNotFound`) always
//! hard-abort. `Paused` is kept separate from validation failures so
//! monitoring can distinguish a halted vault from a violated bound.
//! Risk-engine rejections propagate via the `Risk` variant.

use risk_engine::RiskError;
use thiserror::Error;
use types::scale::ScaleError;

/// Vault ledger errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VaultError {
    #[error("Vault not found: {vault_id}")]
    VaultNotFound { vault_id: String },

    #[error("Vault is paused")]
    Paused,

    #[error("Caller is not the vault owner")]
    NotOwner,

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Insufficient collateral: requested {requested}, available {available}")]
    InsufficientCollateral { requested: u64, available: u64 },

    #[error("Repay amount {requested} exceeds outstanding debt {outstanding}")]
    RepayExceedsDebt { requested: u64, outstanding: u64 },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Risk check rejected: {0}")]
    Risk(#[from] RiskError),

    #[error("Scale conversion failed: {0}")]
    Scale(#[from] ScaleError),
}
