use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Result, SagaId, SagaState, SagaStateStore, SagaStatus, StateStoreError};

/// In-memory state store implementation for tests and demos.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// inspection helpers for asserting on checkpoint behavior.
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    records: Arc<RwLock<HashMap<SagaId, SagaState>>>,
    completed: Arc<RwLock<HashSet<SagaId>>>,
}

impl InMemoryStateStore {
    /// Creates a new empty in-memory state store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for a saga without going through [`SagaStateStore::load`].
    pub async fn get(&self, saga_id: SagaId) -> Option<SagaState> {
        self.records.read().await.get(&saga_id).cloned()
    }

    /// Returns the number of stored records.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns all records currently in the given status.
    pub async fn list_by_status(&self, status: SagaStatus) -> Vec<SagaState> {
        self.records
            .read()
            .await
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect()
    }

    /// Returns true if `mark_complete` was called for the saga.
    pub async fn was_marked_complete(&self, saga_id: SagaId) -> bool {
        self.completed.read().await.contains(&saga_id)
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
        self.completed.write().await.clear();
    }
}

#[async_trait]
impl SagaStateStore for InMemoryStateStore {
    async fn save(&self, state: &SagaState) -> Result<()> {
        let mut records = self.records.write().await;
        let mut record = state.clone();
        if let Some(existing) = records.get(&state.saga_id) {
            record.created_at = existing.created_at;
        }
        records.insert(state.saga_id, record);
        Ok(())
    }

    async fn load(&self, saga_id: SagaId) -> Result<SagaState> {
        self.records
            .read()
            .await
            .get(&saga_id)
            .cloned()
            .ok_or(StateStoreError::NotFound(saga_id))
    }

    async fn mark_complete(&self, saga_id: SagaId) -> Result<()> {
        self.completed.write().await.insert(saga_id);
        Ok(())
    }
}

/// State store that discards everything.
///
/// Useful when durability is not wanted, e.g. one-shot demo sagas.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStateStore;

impl NoopStateStore {
    /// Creates a new no-op state store.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SagaStateStore for NoopStateStore {
    async fn save(&self, _state: &SagaState) -> Result<()> {
        Ok(())
    }

    async fn load(&self, saga_id: SagaId) -> Result<SagaState> {
        Err(StateStoreError::NotFound(saga_id))
    }

    async fn mark_complete(&self, _saga_id: SagaId) -> Result<()> {
        Ok(())
    }
}
