//! The saga orchestrator: sequential forward execution with checkpointed
//! state and strategy-driven compensation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use saga_store::{CompensationStatus, SagaId, SagaState, SagaStateStore, SagaStatus};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SagaError};
use crate::logger::{SagaLogger, TracingLogger};
use crate::step::{FnStep, Step, StepAction};
use crate::strategy::{CompensationRun, CompensationStrategy, FailFastStrategy};

/// One run of a distributed transaction.
///
/// A saga owns an ordered list of steps and a typed payload that every step
/// reads and mutates. [`Saga::execute`] drives the steps in insertion order,
/// checkpointing state after each one; on failure the caller decides whether
/// to invoke [`Saga::compensate`], which walks the completed steps in
/// reverse under the configured [`CompensationStrategy`].
///
/// The payload must not be shared across sagas, and concurrent `execute`
/// calls for the same saga ID are the caller's responsibility to prevent.
pub struct Saga<T> {
    saga_id: SagaId,
    steps: Vec<Box<dyn Step<T>>>,
    payload: T,
    state: SagaState,
    store: Arc<dyn SagaStateStore>,
    strategy: Arc<dyn CompensationStrategy<T>>,
    logger: Arc<dyn SagaLogger>,
}

impl<T> Saga<T>
where
    T: Serialize + Send + 'static,
{
    /// Constructs an empty saga bound to a state store and payload.
    ///
    /// The compensation strategy defaults to [`FailFastStrategy`] and the
    /// logger to [`TracingLogger`].
    pub fn new(store: Arc<dyn SagaStateStore>, saga_id: SagaId, payload: T) -> Self {
        Self {
            saga_id,
            steps: Vec::new(),
            payload,
            state: SagaState::new(saga_id),
            store,
            strategy: Arc::new(FailFastStrategy),
            logger: Arc::new(TracingLogger),
        }
    }

    /// Appends a step built from a forward/inverse closure pair.
    ///
    /// Must be called before [`Saga::execute`]. The name is used verbatim in
    /// logs and state.
    pub fn add_step(
        mut self,
        name: impl Into<String>,
        forward: StepAction<T>,
        inverse: StepAction<T>,
    ) -> Self {
        self.steps.push(Box::new(FnStep::new(name, forward, inverse)));
        self
    }

    /// Appends a step implemented as its own type.
    pub fn with_step(mut self, step: impl Step<T> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Replaces the compensation strategy. May be called any time before
    /// [`Saga::compensate`].
    pub fn with_strategy(mut self, strategy: impl CompensationStrategy<T> + 'static) -> Self {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Replaces the logging sink.
    pub fn with_logger(mut self, logger: impl SagaLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// The saga's stable identifier.
    pub fn saga_id(&self) -> SagaId {
        self.saga_id
    }

    /// The current state record.
    pub fn state(&self) -> &SagaState {
        &self.state
    }

    /// The payload carried through the steps.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Number of steps added so far.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Rebuilds a saga from its persisted state.
    ///
    /// The payload is restored from the record's `data`; step actions are
    /// closures and cannot be persisted, so the caller re-attaches the same
    /// step list before calling [`Saga::compensate`] on a loaded `FAILED`
    /// run.
    pub async fn load(store: Arc<dyn SagaStateStore>, saga_id: SagaId) -> Result<Self>
    where
        T: DeserializeOwned,
    {
        let state = store.load(saga_id).await?;
        let payload: T = serde_json::from_value(state.data.clone())?;
        Ok(Self {
            saga_id,
            steps: Vec::new(),
            payload,
            state,
            store,
            strategy: Arc::new(FailFastStrategy),
            logger: Arc::new(TracingLogger),
        })
    }

    /// Runs the forward pass.
    ///
    /// Steps execute in insertion order; state is checkpointed after every
    /// step outcome. The pass is fail-stop: the first step error freezes
    /// `failed_step`, persists the `FAILED` record, and returns
    /// [`SagaError::StepFailed`] with the original cause. Compensation is
    /// never invoked implicitly.
    #[tracing::instrument(skip_all, fields(saga_id = %self.saga_id))]
    pub async fn execute(&mut self, token: &CancellationToken) -> Result<()> {
        if !self.state.status.can_execute() {
            return Err(SagaError::InvalidState {
                expected: "CREATED",
                actual: self.state.status,
            });
        }

        metrics::counter!("saga_executions_total").increment(1);
        let started = Instant::now();

        // Freeze the step count and make the run visible before any effect.
        self.state.total_steps = self.steps.len() as u32;
        self.state.current_step = 0;
        self.state.status = SagaStatus::Executing;
        self.save_state().await?;

        for index in 0..self.steps.len() {
            if token.is_cancelled() {
                return self.fail(index, started, SagaError::Cancelled).await;
            }

            self.state.current_step = (index + 1) as u32;
            match self.steps[index]
                .forward(token.clone(), &mut self.payload)
                .await
            {
                Ok(()) => {
                    self.save_state().await?;
                    self.logger
                        .info(&format!("Executed: {} - {}", index, self.steps[index].name()));
                }
                Err(cause) => {
                    let step = self.steps[index].name().to_string();
                    self.logger
                        .error(&format!("Step {step} failed: {cause}"));
                    let err = SagaError::StepFailed {
                        step,
                        index,
                        source: cause,
                    };
                    return self.fail(index, started, err).await;
                }
            }
        }

        self.state.status = SagaStatus::Complete;
        self.save_state().await?;
        if let Err(err) = self.store.mark_complete(self.saga_id).await {
            self.logger
                .warn(&format!("mark_complete failed for saga {}: {}", self.saga_id, err));
        }

        metrics::counter!("saga_completed").increment(1);
        metrics::histogram!("saga_duration_seconds").record(started.elapsed().as_secs_f64());
        Ok(())
    }

    /// Runs the reverse pass against the current state.
    ///
    /// Valid only for a saga in `FAILED` status, whether just returned from
    /// [`Saga::execute`] or rebuilt with [`Saga::load`]. Delegates ordering,
    /// retries, and continuation to the configured strategy.
    #[tracing::instrument(skip_all, fields(saga_id = %self.saga_id))]
    pub async fn compensate(&mut self, token: &CancellationToken) -> Result<()> {
        if !self.state.status.can_compensate() {
            return Err(SagaError::InvalidState {
                expected: "FAILED",
                actual: self.state.status,
            });
        }

        metrics::counter!("saga_compensations_total").increment(1);
        self.state.compensated_status = Some(CompensationStatus::Compensating);

        let strategy = Arc::clone(&self.strategy);
        let mut run = CompensationRun::new(
            &self.steps,
            &mut self.payload,
            &mut self.state,
            self.store.as_ref(),
            self.logger.as_ref(),
        );
        run.save().await;

        let result = strategy.compensate(token, &mut run).await;
        if result.is_err() {
            metrics::counter!("saga_compensation_failed").increment(1);
        }
        result
    }

    /// Marks the saga failed at `index`, checkpoints, and returns `err`.
    ///
    /// The step (or cancellation) error outranks a checkpoint failure here:
    /// the save is attempted and a failure only logged.
    async fn fail(&mut self, index: usize, started: Instant, err: SagaError) -> Result<()> {
        self.state.failed_step = Some(index as u32);
        self.state.status = SagaStatus::Failed;
        if let Err(save_err) = self.save_state().await {
            self.logger.error(&format!(
                "Failed to persist state for saga {}: {}",
                self.saga_id, save_err
            ));
        }

        metrics::counter!("saga_failed").increment(1);
        metrics::histogram!("saga_duration_seconds").record(started.elapsed().as_secs_f64());
        Err(err)
    }

    /// Serializes the payload into the record and writes a checkpoint.
    async fn save_state(&mut self) -> Result<()> {
        self.state.data = serde_json::to_value(&self.payload)?;
        self.state.updated_at = Utc::now();
        self.store.save(&self.state).await?;
        Ok(())
    }
}
