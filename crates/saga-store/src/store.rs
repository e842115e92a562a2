use async_trait::async_trait;

use crate::{Result, SagaId, SagaState};

/// Core trait for saga state store implementations.
///
/// The orchestrator treats the store as write-through: every step boundary
/// is a durable checkpoint, and the next step does not begin until the save
/// has returned. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SagaStateStore: Send + Sync {
    /// Upserts the record keyed by `state.saga_id`.
    ///
    /// Mutable fields are overwritten on every call; `created_at` is set by
    /// the first save and never changed by subsequent ones.
    async fn save(&self, state: &SagaState) -> Result<()>;

    /// Returns the current record, or [`StateStoreError::NotFound`].
    ///
    /// [`StateStoreError::NotFound`]: crate::StateStoreError::NotFound
    async fn load(&self, saga_id: SagaId) -> Result<SagaState>;

    /// Hook invoked after a saga reaches `COMPLETE`.
    ///
    /// Stores that archive or prune terminal records implement it; the
    /// default durable store retains them.
    async fn mark_complete(&self, saga_id: SagaId) -> Result<()>;
}
