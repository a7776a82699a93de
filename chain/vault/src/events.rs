//! Vault audit events
//!
//! Every ledger mutation appends exactly one typed event carrying the
//! vault id, the acting party, the amount, and the timestamp. The log
//! is append-only and immutable once emitted.

use serde::{Deserialize, Serialize};
use types::ids::{OwnerId, VaultId};

/// Collateral deposited into a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    pub vault_id: VaultId,
    pub actor: OwnerId,
    pub amount: u64,
    pub timestamp: i64,
}

/// Collateral withdrawn from a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawEvent {
    pub vault_id: VaultId,
    pub actor: OwnerId,
    pub amount: u64,
    pub timestamp: i64,
}

/// Debt recorded against a vault, with the resulting loan-to-value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowEvent {
    pub vault_id: VaultId,
    pub actor: OwnerId,
    pub amount: u64,
    pub ltv_bps: u64,
    pub timestamp: i64,
}

/// Debt repaid against a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepayEvent {
    pub vault_id: VaultId,
    pub actor: OwnerId,
    pub amount: u64,
    pub timestamp: i64,
}

/// Hedge position opened or (partially) closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgePositionEvent {
    pub vault_id: VaultId,
    pub actor: OwnerId,
    pub size: u64,
    pub is_open: bool,
    pub timestamp: i64,
}

/// Vault paused or unpaused by the admin capability holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPauseEvent {
    pub vault_id: VaultId,
    pub paused: bool,
    pub timestamp: i64,
}

/// Enum wrapper for all vault events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    Deposit(DepositEvent),
    Withdraw(WithdrawEvent),
    Borrow(BorrowEvent),
    Repay(RepayEvent),
    HedgePosition(HedgePositionEvent),
    Pause(VaultPauseEvent),
}
