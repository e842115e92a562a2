//! The durable state record for one saga run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::SagaId;

/// The status of a saga in its lifecycle.
///
/// Status transitions:
/// ```text
/// CREATED ──► EXECUTING ──┬──► COMPLETE
///                         └──► FAILED ──► (compensation tracked separately)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStatus {
    /// Saga has been constructed but not yet executed.
    #[default]
    Created,

    /// Forward steps are being executed.
    Executing,

    /// The reverse pass is in progress.
    Compensating,

    /// All steps completed successfully (terminal).
    Complete,

    /// A forward step failed; see `failed_step` and `compensated_status`.
    Failed,
}

impl SagaStatus {
    /// Returns true if the saga can begin the forward pass.
    pub fn can_execute(&self) -> bool {
        matches!(self, SagaStatus::Created)
    }

    /// Returns true if the saga can begin the reverse pass.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaStatus::Failed)
    }

    /// Returns the status name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Created => "CREATED",
            SagaStatus::Executing => "EXECUTING",
            SagaStatus::Compensating => "COMPENSATING",
            SagaStatus::Complete => "COMPLETE",
            SagaStatus::Failed => "FAILED",
        }
    }

    /// Parses a persisted status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(SagaStatus::Created),
            "EXECUTING" => Some(SagaStatus::Executing),
            "COMPENSATING" => Some(SagaStatus::Compensating),
            "COMPLETE" => Some(SagaStatus::Complete),
            "FAILED" => Some(SagaStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of the reverse pass, tracked independently of [`SagaStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompensationStatus {
    /// Inverse actions are being executed.
    Compensating,

    /// Every prior step was compensated successfully.
    Complete,

    /// At least one compensation gave up; manual remediation required.
    Failed,
}

impl CompensationStatus {
    /// Returns the status name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationStatus::Compensating => "COMPENSATING",
            CompensationStatus::Complete => "COMPLETE",
            CompensationStatus::Failed => "FAILED",
        }
    }

    /// Parses a persisted status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COMPENSATING" => Some(CompensationStatus::Compensating),
            "COMPLETE" => Some(CompensationStatus::Complete),
            "FAILED" => Some(CompensationStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for CompensationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The durable record for one saga run, checkpointed at every step boundary.
///
/// Invariants:
/// - `current_step` is 1-based and never exceeds `total_steps`.
/// - `failed_step` (0-based) is set exactly when `status` is `Failed`.
/// - `compensated_steps` holds each index at most once, appended in reverse
///   execution order.
/// - `total_steps` is frozen when execution starts.
/// - `created_at` is set at first save and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaState {
    pub saga_id: SagaId,
    pub status: SagaStatus,
    pub total_steps: u32,
    pub current_step: u32,
    pub failed_step: Option<u32>,
    pub compensated_steps: Vec<u32>,
    pub compensated_status: Option<CompensationStatus>,
    /// Serialized payload as of the most recent save.
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SagaState {
    /// Creates a fresh record in `Created` status.
    pub fn new(saga_id: SagaId) -> Self {
        let now = Utc::now();
        Self {
            saga_id,
            status: SagaStatus::Created,
            total_steps: 0,
            current_step: 0,
            failed_step: None,
            compensated_steps: Vec::new(),
            compensated_status: None,
            data: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a compensated step index, ignoring duplicates.
    pub fn record_compensated(&mut self, index: u32) {
        if !self.compensated_steps.contains(&index) {
            self.compensated_steps.push(index);
        }
    }

    /// Returns true if the record will never be rewritten by the
    /// orchestrator: either the saga completed, or it failed and the
    /// reverse pass has finished (successfully or not).
    pub fn is_terminal(&self) -> bool {
        match self.status {
            SagaStatus::Complete => true,
            SagaStatus::Failed => matches!(
                self.compensated_status,
                Some(CompensationStatus::Complete) | Some(CompensationStatus::Failed)
            ),
            _ => false,
        }
    }
}
