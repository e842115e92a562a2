//! Saga steps: a named pair of forward and inverse actions.

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

/// Error type produced by step actions.
///
/// Steps surface whatever error their adapters return; the orchestrator
/// preserves it as the cause chain of the resulting saga error.
pub type StepError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a forward or inverse action.
pub type StepResult = Result<(), StepError>;

/// Boxed step action closed over its adapter clients.
///
/// Receives the cancellation token and the live payload; communicates with
/// other steps only through the payload.
pub type StepAction<T> = Box<
    dyn for<'a> Fn(CancellationToken, &'a mut T) -> BoxFuture<'a, StepResult> + Send + Sync,
>;

/// One element of a saga's ordered step list.
///
/// Both actions must be idempotent with respect to retries: an inverse
/// action may run more than once for the same step. The name is used
/// verbatim in logs and need not be unique, though it should be.
#[async_trait]
pub trait Step<T: Send>: Send + Sync {
    /// Human-readable step name.
    fn name(&self) -> &str;

    /// Runs the forward action.
    async fn forward(&self, token: CancellationToken, payload: &mut T) -> StepResult;

    /// Runs the inverse action, semantically undoing the forward action.
    async fn inverse(&self, token: CancellationToken, payload: &mut T) -> StepResult;
}

/// A [`Step`] built from a pair of closures.
///
/// This is what [`Saga::add_step`] constructs; domain steps that warrant a
/// named type can implement [`Step`] directly instead.
///
/// [`Saga::add_step`]: crate::Saga::add_step
pub struct FnStep<T> {
    name: String,
    forward: StepAction<T>,
    inverse: StepAction<T>,
}

impl<T> FnStep<T> {
    /// Creates a step from a name and a forward/inverse action pair.
    pub fn new(name: impl Into<String>, forward: StepAction<T>, inverse: StepAction<T>) -> Self {
        Self {
            name: name.into(),
            forward,
            inverse,
        }
    }
}

#[async_trait]
impl<T: Send> Step<T> for FnStep<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn forward(&self, token: CancellationToken, payload: &mut T) -> StepResult {
        (self.forward)(token, payload).await
    }

    async fn inverse(&self, token: CancellationToken, payload: &mut T) -> StepResult {
        (self.inverse)(token, payload).await
    }
}
