//! culina-api - HTTP API server for the culina re-embedding service.

use std::sync::Arc;

use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use culina_api::config::ApiConfig;
use culina_api::{router, AppState, MakeRequestUuidV7};
use culina_core::{BatchEmbedBackend, CheckpointRepository};
use culina_db::{create_pool, ensure_schema, PgCheckpointStore};
use culina_inference::HttpEmbedBackend;
use culina_jobs::{JobLauncher, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    ensure_schema(&pool).await?;
    let store: Arc<dyn CheckpointRepository> = Arc::new(PgCheckpointStore::new(pool));

    let backend: Arc<dyn BatchEmbedBackend> = Arc::new(HttpEmbedBackend::from_env());
    info!(backend = %backend.describe(), "Embedding backend configured");

    let launcher = Arc::new(JobLauncher::new(
        backend,
        store.clone(),
        WorkerConfig::from_env(),
    ));

    let state = AppState {
        store,
        launcher,
        admin_token: config.admin_token.clone(),
    };

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "culina API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}
