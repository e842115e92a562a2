use async_trait::async_trait;
use saga_store::CompensationStatus;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{CompensationError, CompensationFailure, Result, SagaError};
use crate::strategy::retry::{RetryFailure, compensate_with_retry};
use crate::strategy::{CompensationRun, CompensationStrategy, RetryConfig};

/// Reverse pass that never aborts on failure.
///
/// Every remaining step is attempted with the same per-step backoff as
/// [`RetryStrategy`]; permanent failures are collected and reported together
/// in a [`CompensationError`] so an operator can remediate the partial
/// rollback.
///
/// [`RetryStrategy`]: crate::strategy::RetryStrategy
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinueAllStrategy {
    config: RetryConfig,
}

impl ContinueAllStrategy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<T> CompensationStrategy<T> for ContinueAllStrategy
where
    T: Serialize + Send,
{
    async fn compensate(
        &self,
        token: &CancellationToken,
        run: &mut CompensationRun<'_, T>,
    ) -> Result<()> {
        let mut failures: Vec<CompensationFailure> = Vec::new();

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
                    failures.push(CompensationFailure {
                        step,
                        attempts: self.config.total_attempts(),
                        cause,
                    });
                }
            }
        }

        if failures.is_empty() {
            run.set_compensation_status(CompensationStatus::Complete)
                .await;
            Ok(())
        } else {
            run.set_compensation_status(CompensationStatus::Failed).await;
            Err(CompensationError { failures }.into())
        }
    }
}
