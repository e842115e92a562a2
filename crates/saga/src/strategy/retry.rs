use std::time::Duration;

use async_trait::async_trait;
use saga_store::CompensationStatus;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SagaError};
use crate::step::StepError;
use crate::strategy::{CompensationRun, CompensationStrategy};

/// Retry behavior shared by the backoff-based strategies.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Additional attempts after the first, per step.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Exponential growth factor applied to the delay after each retry.
    pub backoff_multiple: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_multiple: 2.0,
        }
    }
}

impl RetryConfig {
    /// Total attempts made per step, counting the first.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    fn next_backoff(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff_multiple).min(self.max_backoff)
    }
}

/// Why a retried compensation stopped.
pub(crate) enum RetryFailure {
    /// The cancellation context fired during a backoff wait.
    Cancelled,
    /// All attempts were used up; carries the final error.
    Exhausted(StepError),
}

/// Runs the inverse action of one step with exponential backoff.
///
/// Waits are raced against the cancellation token, so cancellation is
/// observed within one backoff interval.
pub(crate) async fn compensate_with_retry<T>(
    run: &mut CompensationRun<'_, T>,
    index: usize,
    token: &CancellationToken,
    config: &RetryConfig,
) -> std::result::Result<(), RetryFailure>
where
    T: Serialize + Send,
{
    let mut backoff = config.initial_backoff;
    let mut attempt = 0;

    loop {
        match run.run_inverse(index, token).await {
            Ok(()) => return Ok(()),
            Err(cause) => {
                if attempt >= config.max_retries {
                    return Err(RetryFailure::Exhausted(cause));
                }
                run.logger().warn(&format!(
                    "Compensation failed for {} (attempt {}/{}): {}. Retrying in {:?}...",
                    run.step_name(index),
                    attempt + 1,
                    config.total_attempts(),
                    cause,
                    backoff
                ));

                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = token.cancelled() => return Err(RetryFailure::Cancelled),
                }

                backoff = config.next_backoff(backoff);
                attempt += 1;
            }
        }
    }
}

/// Reverse pass with per-step exponential backoff.
///
/// A step that exhausts its retries aborts the pass; earlier steps are not
/// attempted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryStrategy {
    config: RetryConfig,
}

impl RetryStrategy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<T> CompensationStrategy<T> for RetryStrategy
where
    T: Serialize + Send,
{
    async fn compensate(
        &self,
        token: &CancellationToken,
        run: &mut CompensationRun<'_, T>,
    ) -> Result<()> {
        for index in (0..run.failed_step()).rev() {
            if run.is_compensated(index) {
                continue;
            }
            match compensate_with_retry(run, index, token, &self.config).await {
                Ok(()) => {
                    run.record_compensated(index).await;
                    run.logger()
                        .info(&format!("Compensated: {}", run.step_name(index)));
                }
                Err(RetryFailure::Cancelled) => {
                    run.save().await;
                    return Err(SagaError::Cancelled);
                }
                Err(RetryFailure::Exhausted(cause)) => {
                    let step = run.step_name(index).to_string();
                    run.logger().error(&format!(
                        "CRITICAL: Compensation failed for {step} after all retries: {cause}"
                    ));
                    run.set_compensation_status(CompensationStatus::Failed).await;
                    return Err(SagaError::CompensationFailed {
                        step,
                        attempts: self.config.total_attempts(),
                        source: cause,
                    });
                }
            }
        }

        run.set_compensation_status(CompensationStatus::Complete)
            .await;
        Ok(())
    }
}
