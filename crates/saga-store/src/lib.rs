//! Durable state persistence for saga runs.
//!
//! A saga checkpoints its [`SagaState`] record at every step boundary so
//! failed runs can be diagnosed, compensated, or resumed. This crate defines
//! the record, the [`SagaStateStore`] contract, and three implementations:
//! an in-memory store for tests and demos, a no-op store that discards
//! everything, and a PostgreSQL store backed by the `saga_states` table.

pub mod error;
pub mod id;
pub mod memory;
pub mod postgres;
pub mod state;
pub mod store;

pub use error::{Result, StateStoreError};
pub use id::SagaId;
pub use memory::{InMemoryStateStore, NoopStateStore};
pub use postgres::PostgresStateStore;
pub use state::{CompensationStatus, SagaState, SagaStatus};
pub use store::SagaStateStore;
