//! Onboarding saga host entry point.

use std::sync::Arc;

use saga_client::services::{
    InMemoryApplicationService, InMemoryCustomerService, InMemoryLoanService,
};
use saga_client::{Config, OnboardingData, OnboardingSaga};
use saga_store::{InMemoryStateStore, PostgresStateStore, SagaStateStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn build_store(config: &Config) -> Arc<dyn SagaStateStore> {
    match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(url)
                .await
                .expect("failed to connect to database");

            let store = PostgresStateStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            tracing::info!("using PostgreSQL state store");
            Arc::new(store)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory state store");
            Arc::new(InMemoryStateStore::new())
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = build_store(&config).await;

    let onboarding = OnboardingSaga::new(
        store,
        Arc::new(InMemoryCustomerService::new()),
        Arc::new(InMemoryApplicationService::new()),
        Arc::new(InMemoryLoanService::new()),
    );

    let data = OnboardingData::new("John", "john@makes.beats", 250_000.0, 400_000.0, 3.5, 30);

    let token = CancellationToken::new();
    match onboarding.onboard(&token, data).await {
        Ok(saga_id) => {
            tracing::info!(%saga_id, "onboarding saga completed");
        }
        Err(err) => {
            if let Some(report) = err.as_compensation_error() {
                tracing::error!("onboarding failed with partial rollback:\n{report}");
            } else {
                tracing::error!(error = %err, "onboarding saga failed");
            }
            std::process::exit(1);
        }
    }
}
