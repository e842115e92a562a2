use async_trait::async_trait;
use saga_store::CompensationStatus;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SagaError};
use crate::strategy::{CompensationRun, CompensationStrategy};

/// Reverse pass with no retries: one inverse attempt per step, abort on the
/// first error.
///
/// The default strategy. Suited to tests and demos where failures should
/// surface immediately rather than be retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFastStrategy;

impl FailFastStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<T> CompensationStrategy<T> for FailFastStrategy
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
            match run.run_inverse(index, token).await {
                Ok(()) => {
                    run.record_compensated(index).await;
                    run.logger()
                        .info(&format!("Compensated: {}", run.step_name(index)));
                }
                Err(cause) => {
                    let step = run.step_name(index).to_string();
                    run.logger()
                        .error(&format!("Compensation failed for {step}: {cause}"));
                    run.set_compensation_status(CompensationStatus::Failed).await;
                    return Err(SagaError::CompensationFailed {
                        step,
                        attempts: 1,
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
