//! Saga error taxonomy.
//!
//! Three failure families are kept distinct so callers can react
//! appropriately at the boundary: a forward step failed and the saga can be
//! rolled back ([`SagaError::StepFailed`]), one or more inverse actions did
//! not succeed and the system is in a partially rolled back state
//! ([`SagaError::CompensationFailed`] / [`SagaError::Compensation`]), or the
//! caller's cancellation context fired ([`SagaError::Cancelled`]).

use saga_store::{SagaStatus, StateStoreError};
use thiserror::Error;

use crate::step::StepError;

/// Errors returned by [`Saga::execute`] and [`Saga::compensate`].
///
/// [`Saga::execute`]: crate::Saga::execute
/// [`Saga::compensate`]: crate::Saga::compensate
#[derive(Debug, Error)]
pub enum SagaError {
    /// The saga is in the wrong status for the requested operation.
    #[error("Invalid saga status: expected {expected}, actual {actual}")]
    InvalidState {
        expected: &'static str,
        actual: SagaStatus,
    },

    /// A forward step failed; the saga needs to be rolled back.
    #[error("Step '{step}' (index {index}) failed: {source}")]
    StepFailed {
        step: String,
        index: usize,
        #[source]
        source: StepError,
    },

    /// A single inverse action gave up; the reverse pass was aborted.
    #[error("Compensation failed for step '{step}' after {attempts} attempt(s): {source}")]
    CompensationFailed {
        step: String,
        attempts: u32,
        #[source]
        source: StepError,
    },

    /// One or more inverse actions failed permanently; partial rollback.
    #[error(transparent)]
    Compensation(#[from] CompensationError),

    /// The cancellation context fired during a wait.
    #[error("Operation cancelled")]
    Cancelled,

    /// A state checkpoint could not be made durable.
    #[error("State store error: {0}")]
    Store(#[from] StateStoreError),

    /// The payload could not be serialized for a checkpoint.
    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SagaError {
    /// Returns the detailed compensation report if this error carries one.
    ///
    /// Lets an API layer distinguish "rolled back, retryable" from
    /// "inconsistent state, page an operator".
    pub fn as_compensation_error(&self) -> Option<&CompensationError> {
        match self {
            SagaError::Compensation(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if the error came from the cancellation context.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SagaError::Cancelled)
    }
}

/// The outcome of compensating a single step that failed permanently.
#[derive(Debug)]
pub struct CompensationFailure {
    /// Name of the step whose inverse action gave up.
    pub step: String,
    /// Total inverse attempts made for the step.
    pub attempts: u32,
    /// The final underlying error.
    pub cause: StepError,
}

/// Error returned when a reverse pass finished with unresolved steps.
///
/// Emitted by the continue-all strategy, which attempts every remaining
/// step and collects the permanent failures instead of aborting.
#[derive(Debug)]
pub struct CompensationError {
    pub failures: Vec<CompensationFailure>,
}

impl std::fmt::Display for CompensationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "One or more compensation steps failed:")?;
        for failure in &self.failures {
            writeln!(
                f,
                "  - {}: {} (attempts: {})",
                failure.step, failure.cause, failure.attempts
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for CompensationError {}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
