use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::info;

use super::{
    services::{enqueue_sync_job, health, list_dead_letters, metrics},
    state::AppState,
};
use crate::catalog::FjallCatalog;
use crate::config::Config;
use crate::credentials::CredentialResolver;
use crate::observability::Metrics;
use crate::provider::DriveClient;
use crate::queue::{FjallQueue, JobBroker};
use crate::secrets::AesGcmCipher;
use crate::sync::{ImportEngine, SyncPipeline};
use crate::worker::SyncWorker;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/sync-jobs", post(enqueue_sync_job))
        .route("/operators/dlq", get(list_dead_letters))
        .with_state(state)
}

/// Open local state, start the worker pool, and serve the operator API
/// until Ctrl+C or SIGTERM
pub async fn run(config: Config) -> Result<(), AnyError> {
    let key = config
        .secrets
        .encryption_key
        .as_deref()
        .ok_or("MEDIASYNC_SECRET_KEY is not set")?;
    let cipher = AesGcmCipher::from_hex_key(key)
        .map_err(|e| format!("Invalid MEDIASYNC_SECRET_KEY: {}", e))?;

    let catalog_path = config.server.catalog_path();
    info!(path = %catalog_path.display(), "Opening catalog");
    let catalog = Arc::new(FjallCatalog::open(&catalog_path)?);
    let stats = catalog.stats()?;
    info!(
        media = stats.media_count,
        integrations = stats.integration_count,
        "Catalog opened"
    );

    let queue_path = config.server.queue_path();
    info!(path = %queue_path.display(), "Opening FjallQueue");
    let queue = Arc::new(RwLock::new(FjallQueue::open(&queue_path)?));

    let provider = Arc::new(DriveClient::new(&config.provider)?);

    let (broker, receivers) = JobBroker::new(
        queue.clone(),
        config.worker.concurrency,
        config.worker.channel_size,
    );
    let broker = Arc::new(broker);
    let metrics = Arc::new(Metrics::new());

    let pipeline = SyncPipeline::new(
        CredentialResolver::new(catalog.clone(), Arc::new(cipher), provider.clone()),
        provider,
        ImportEngine::new(
            catalog.clone(),
            config.provider.content_host.clone(),
            config.worker.failure_policy,
        ),
        catalog.clone(),
    );

    let worker = Arc::new(
        SyncWorker::builder()
            .queue(queue.clone())
            .broker(broker.clone())
            .pipeline(Arc::new(pipeline))
            .retry(config.worker.retry.clone())
            .metrics(metrics.clone())
            .build(),
    );
    let workers = worker.start(receivers).await;

    let app = router(AppState::new(queue.clone(), broker, metrics));

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    info!(address = %config.server.bind_addr, "mediasync operator API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    workers.stop().await;
    queue.read().await.flush()?;
    catalog.persist()?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
