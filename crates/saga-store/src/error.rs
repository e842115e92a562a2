use thiserror::Error;

use crate::id::SagaId;

/// Errors that can occur when interacting with the saga state store.
#[derive(Debug, Error)]
pub enum StateStoreError {
    /// No state record exists for the given saga ID.
    #[error("Saga state not found: {0}")]
    NotFound(SagaId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for state store operations.
pub type Result<T> = std::result::Result<T, StateStoreError>;
