//! Compensation strategies: policies for the reverse pass.
//!
//! A strategy decides how inverse actions are retried and whether the pass
//! continues past a permanent failure. Three built-ins are provided:
//!
//! - [`FailFastStrategy`] — one attempt per step, abort on the first error.
//! - [`RetryStrategy`] — exponential backoff per step, abort once a step
//!   exhausts its retries.
//! - [`ContinueAllStrategy`] — same backoff, but never aborts; collects
//!   every permanent failure into one report. The production default
//!   candidate: do as much rollback as possible, then alert.

pub mod continue_all;
pub mod fail_fast;
pub mod retry;

pub use continue_all::ContinueAllStrategy;
pub use fail_fast::FailFastStrategy;
pub use retry::{RetryConfig, RetryStrategy};

use async_trait::async_trait;
use chrono::Utc;
use saga_store::{CompensationStatus, SagaState, SagaStateStore};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::logger::SagaLogger;
use crate::step::{Step, StepResult};

/// Policy controlling the reverse pass.
///
/// Implementations walk indices `failed_step - 1 ..= 0`, invoking inverse
/// actions through the [`CompensationRun`] view. They must not touch the
/// step list beyond reading it, and must route every state change through
/// the view's save path so observers can follow progress.
#[async_trait]
pub trait CompensationStrategy<T: Send>: Send + Sync {
    async fn compensate(
        &self,
        token: &CancellationToken,
        run: &mut CompensationRun<'_, T>,
    ) -> Result<()>;
}

/// The orchestrator's view handed to a strategy for one reverse pass.
///
/// Exposes read-only access to the step list plus the mutation points a
/// strategy needs: running inverse actions, recording progress, and
/// checkpointing. Checkpoint failures during compensation are logged and
/// never abort the pass.
pub struct CompensationRun<'a, T> {
    steps: &'a [Box<dyn Step<T>>],
    payload: &'a mut T,
    state: &'a mut SagaState,
    store: &'a dyn SagaStateStore,
    logger: &'a dyn SagaLogger,
}

impl<'a, T> CompensationRun<'a, T>
where
    T: Serialize + Send,
{
    pub(crate) fn new(
        steps: &'a [Box<dyn Step<T>>],
        payload: &'a mut T,
        state: &'a mut SagaState,
        store: &'a dyn SagaStateStore,
        logger: &'a dyn SagaLogger,
    ) -> Self {
        Self {
            steps,
            payload,
            state,
            store,
            logger,
        }
    }

    /// Index of the forward step that failed.
    ///
    /// The reverse pass covers strictly lower indices; the failed step
    /// itself is never compensated. Falls back to the full step count when
    /// no failure index was recorded.
    pub fn failed_step(&self) -> usize {
        self.state
            .failed_step
            .map(|i| i as usize)
            .unwrap_or(self.state.total_steps as usize)
    }

    /// Name of the step at `index`.
    pub fn step_name(&self, index: usize) -> &str {
        self.steps[index].name()
    }

    /// Returns true if the step at `index` is already durably recorded as
    /// compensated, e.g. by a reverse pass that was cancelled partway.
    pub fn is_compensated(&self, index: usize) -> bool {
        self.state.compensated_steps.contains(&(index as u32))
    }

    /// The current state record.
    pub fn state(&self) -> &SagaState {
        self.state
    }

    /// The injected logging sink.
    pub fn logger(&self) -> &dyn SagaLogger {
        self.logger
    }

    /// Invokes the inverse action of the step at `index`.
    pub async fn run_inverse(&mut self, index: usize, token: &CancellationToken) -> StepResult {
        self.steps[index].inverse(token.clone(), self.payload).await
    }

    /// Records a successfully compensated step and checkpoints.
    pub async fn record_compensated(&mut self, index: usize) {
        self.state.record_compensated(index as u32);
        self.save().await;
    }

    /// Sets the reverse-pass outcome and checkpoints.
    pub async fn set_compensation_status(&mut self, status: CompensationStatus) {
        self.state.compensated_status = Some(status);
        self.save().await;
    }

    /// Best-effort checkpoint of the current state and payload.
    pub async fn save(&mut self) {
        match serde_json::to_value(&*self.payload) {
            Ok(data) => self.state.data = data,
            Err(err) => {
                self.logger.warn(&format!(
                    "Failed to serialize payload for saga {}: {}",
                    self.state.saga_id.short(),
                    err
                ));
            }
        }
        self.state.updated_at = Utc::now();
        if let Err(err) = self.store.save(self.state).await {
            self.logger.warn(&format!(
                "Failed to checkpoint saga {}: {}",
                self.state.saga_id.short(),
                err
            ));
        }
    }
}
