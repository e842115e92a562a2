//! Saga orchestration for distributed business transactions.
//!
//! A saga models a transaction spanning several independent services as an
//! ordered list of steps, each pairing a forward action with a semantically
//! inverse compensating action. Steps run sequentially over a shared typed
//! payload; if one fails, the completed steps are undone in reverse order
//! under a pluggable compensation strategy. Progress is checkpointed to a
//! [`SagaStateStore`] at every step boundary so failed runs can be
//! diagnosed, compensated later, or resumed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use saga::{ContinueAllStrategy, RetryConfig, Saga};
//! use saga_store::{InMemoryStateStore, SagaId};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[derive(serde::Serialize, serde::Deserialize)]
//! # struct SignupData { user_id: Option<u64> }
//! # async fn demo(data: SignupData) -> Result<(), saga::SagaError> {
//! let store = Arc::new(InMemoryStateStore::new());
//! let mut saga = Saga::new(store, SagaId::new(), data)
//!     .with_strategy(ContinueAllStrategy::new(RetryConfig::default()))
//!     .add_step(
//!         "CreateUser",
//!         Box::new(|_token, data| Box::pin(async move {
//!             data.user_id = Some(42);
//!             Ok(())
//!         })),
//!         Box::new(|_token, data| Box::pin(async move {
//!             data.user_id = None;
//!             Ok(())
//!         })),
//!     );
//!
//! let token = CancellationToken::new();
//! if let Err(err) = saga.execute(&token).await {
//!     saga.compensate(&token).await?;
//!     return Err(err);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod logger;
pub mod saga;
pub mod step;
pub mod strategy;

pub use error::{CompensationError, CompensationFailure, SagaError};
pub use saga_store::{CompensationStatus, SagaId, SagaState, SagaStateStore, SagaStatus};
pub use logger::{LogLevel, MemoryLogger, SagaLogger, TracingLogger};
pub use saga::Saga;
pub use step::{FnStep, Step, StepAction, StepError, StepResult};
pub use strategy::{
    CompensationRun, CompensationStrategy, ContinueAllStrategy, FailFastStrategy, RetryConfig,
    RetryStrategy,
};
