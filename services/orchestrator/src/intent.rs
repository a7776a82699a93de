//! Write-ahead intent log
//!
//! Each saga step is recorded as `Pending` before it runs, then marked
//! `Confirmed` or `Failed`. When a later step fails, confirmed steps
//! are compensated in reverse order and marked `Compensated`. The log
//! is the audit record of what the saga attempted and how far it got.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One step of a hedge open or close saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    AttachPrice,
    LockCollateral,
    DrawDebt,
    PlaceHedge,
    PlaceCover,
    RepayDebt,
    ReleaseCollateral,
    CommitLedger,
}

/// Lifecycle of one logged step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Confirmed,
    Failed,
    Compensated,
}

/// One write-ahead record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub intent_id: Uuid,
    pub step: Step,
    pub status: StepStatus,
    pub timestamp: i64,
}

/// Append-only log of saga steps for one orchestration call.
#[derive(Debug, Default)]
pub struct IntentLog {
    records: Vec<IntentRecord>,
}

impl IntentLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a step as pending before executing it. Returns the
    /// record index for later status transitions.
    pub fn begin(&mut self, step: Step, now: i64) -> usize {
        self.records.push(IntentRecord {
            intent_id: Uuid::now_v7(),
            step,
            status: StepStatus::Pending,
            timestamp: now,
        });
        self.records.len() - 1
    }

    pub fn confirm(&mut self, index: usize, now: i64) {
        self.set_status(index, StepStatus::Confirmed, now);
    }

    pub fn fail(&mut self, index: usize, now: i64) {
        self.set_status(index, StepStatus::Failed, now);
    }

    pub fn compensate(&mut self, index: usize, now: i64) {
        self.set_status(index, StepStatus::Compensated, now);
    }

    /// All records in execution order.
    pub fn records(&self) -> &[IntentRecord] {
        &self.records
    }

    /// True when every step confirmed (the unit committed).
    pub fn is_settled(&self) -> bool {
        !self.records.is_empty()
            && self
                .records
                .iter()
                .all(|r| r.status == StepStatus::Confirmed)
    }

    /// True when no confirmed step is left uncompensated after a
    /// failure (the unit fully rolled back).
    pub fn is_rolled_back(&self) -> bool {
        self.records.iter().any(|r| r.status == StepStatus::Failed)
            && !self
                .records
                .iter()
                .any(|r| r.status == StepStatus::Confirmed || r.status == StepStatus::Pending)
    }

    fn set_status(&mut self, index: usize, status: StepStatus, now: i64) {
        if let Some(record) = self.records.get_mut(index) {
            record.status = status;
            record.timestamp = now;
        }
    }
}
