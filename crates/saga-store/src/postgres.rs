use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CompensationStatus, Result, SagaId, SagaState, SagaStateStore, SagaStatus, StateStoreError,
};

/// PostgreSQL-backed saga state store.
#[derive(Clone)]
pub struct PostgresStateStore {
    pool: PgPool,
}

impl PostgresStateStore {
    /// Creates a new PostgreSQL state store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Returns all records currently in the given status.
    ///
    /// Backed by the `(status)` index; used operationally to list failed
    /// sagas awaiting remediation.
    pub async fn list_by_status(&self, status: SagaStatus) -> Result<Vec<SagaState>> {
        let rows = sqlx::query(
            r#"
            SELECT saga_id, status, total_steps, current_step, failed_step,
                   compensated_steps, compensated_status, data, created_at, updated_at
            FROM saga_states
            WHERE status = $1
            ORDER BY updated_at ASC
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_state).collect()
    }

    /// Returns records in the given status not touched since `older_than`.
    ///
    /// Backed by the `(updated_at)` index; used operationally to find stale
    /// in-flight sagas whose process died mid-run.
    pub async fn list_stale(
        &self,
        status: SagaStatus,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<SagaState>> {
        let rows = sqlx::query(
            r#"
            SELECT saga_id, status, total_steps, current_step, failed_step,
                   compensated_steps, compensated_status, data, created_at, updated_at
            FROM saga_states
            WHERE status = $1 AND updated_at < $2
            ORDER BY updated_at ASC
            "#,
        )
        .bind(status.as_str())
        .bind(older_than)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_state).collect()
    }

    fn row_to_state(row: PgRow) -> Result<SagaState> {
        let status_raw: String = row.try_get("status")?;
        let status = SagaStatus::parse(&status_raw)
            .ok_or_else(|| invalid_column("status", &status_raw))?;

        let compensated_status = row
            .try_get::<Option<String>, _>("compensated_status")?
            .map(|raw| {
                CompensationStatus::parse(&raw)
                    .ok_or_else(|| invalid_column("compensated_status", &raw))
            })
            .transpose()?;

        let compensated_steps: Vec<i32> = row.try_get("compensated_steps")?;

        Ok(SagaState {
            saga_id: SagaId::from_uuid(row.try_get::<Uuid, _>("saga_id")?),
            status,
            total_steps: row.try_get::<i32, _>("total_steps")? as u32,
            current_step: row.try_get::<i32, _>("current_step")? as u32,
            failed_step: row
                .try_get::<Option<i32>, _>("failed_step")?
                .map(|i| i as u32),
            compensated_steps: compensated_steps.into_iter().map(|i| i as u32).collect(),
            compensated_status,
            data: row.try_get("data")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn invalid_column(column: &str, value: &str) -> StateStoreError {
    StateStoreError::Serialization(serde_json::Error::io(std::io::Error::other(format!(
        "invalid {column} value: {value}"
    ))))
}

#[async_trait]
impl SagaStateStore for PostgresStateStore {
    async fn save(&self, state: &SagaState) -> Result<()> {
        let compensated_steps: Vec<i32> =
            state.compensated_steps.iter().map(|&i| i as i32).collect();

        sqlx::query(
            r#"
            INSERT INTO saga_states
                (saga_id, status, total_steps, current_step, failed_step,
                 compensated_steps, compensated_status, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (saga_id) DO UPDATE SET
                status = EXCLUDED.status,
                total_steps = EXCLUDED.total_steps,
                current_step = EXCLUDED.current_step,
                failed_step = EXCLUDED.failed_step,
                compensated_steps = EXCLUDED.compensated_steps,
                compensated_status = EXCLUDED.compensated_status,
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(state.saga_id.as_uuid())
        .bind(state.status.as_str())
        .bind(state.total_steps as i32)
        .bind(state.current_step as i32)
        .bind(state.failed_step.map(|i| i as i32))
        .bind(compensated_steps)
        .bind(state.compensated_status.map(|s| s.as_str()))
        .bind(&state.data)
        .bind(state.created_at)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load(&self, saga_id: SagaId) -> Result<SagaState> {
        let row = sqlx::query(
            r#"
            SELECT saga_id, status, total_steps, current_step, failed_step,
                   compensated_steps, compensated_status, data, created_at, updated_at
            FROM saga_states
            WHERE saga_id = $1
            "#,
        )
        .bind(saga_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_state(row),
            None => Err(StateStoreError::NotFound(saga_id)),
        }
    }

    async fn mark_complete(&self, _saga_id: SagaId) -> Result<()> {
        // Terminal records are retained for audit; stores that archive or
        // prune override this behavior.
        Ok(())
    }
}
