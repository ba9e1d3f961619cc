//! Haste Store - A paste server with expiring, compressed documents
//!
//! Binary entry point: wires configuration, backend, document handler and
//! HTTP server together.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use haste_store::backend::{KvBackend, MemoryBackend, RedisBackend};
use haste_store::config::{Config, StorageType};
use haste_store::store::DocumentStore;
use haste_store::{
    create_router, keygen, seed_static_documents, spawn_cleanup_task, AppState, DocumentHandler,
};

/// Main entry point for the paste server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the configured backend (starting the sweep task for memory)
/// 4. Build the document handler and seed static documents
/// 5. Serve HTTP until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" for this crate, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "haste_store=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Haste Store");

    let config = Config::from_env();
    info!(
        "Configuration loaded: storage={:?}, key_length={}, max_length={:?}, expire={:?}s, port={}",
        config.storage, config.key_length, config.max_length, config.expire, config.server_port
    );

    let (backend, cleanup_handle) = connect_backend(&config).await?;
    let store = DocumentStore::new(backend, config.expire);

    let documents = DocumentHandler::new(store, keygen::from_type(config.key_generator))
        .with_key_length(config.key_length)
        .with_max_length(config.max_length)
        .with_static_names(config.documents.iter().map(|(name, _)| name.clone()));
    let seeded = seed_static_documents(&documents, &config.documents).await;
    if !config.documents.is_empty() {
        info!("Seeded {} of {} static documents", seeded, config.documents.len());
    }

    let app = create_router(AppState::new(documents));

    let addr = format!("{}:{}", config.host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Builds the configured backend. The memory backend comes with its sweep task.
async fn connect_backend(
    config: &Config,
) -> anyhow::Result<(Arc<dyn KvBackend>, Option<JoinHandle<()>>)> {
    match config.storage {
        StorageType::Memory => {
            let backend = Arc::new(MemoryBackend::new());
            let handle = spawn_cleanup_task(backend.clone(), config.cleanup_interval);
            info!("Using in-memory backend");
            let backend: Arc<dyn KvBackend> = backend;
            Ok((backend, Some(handle)))
        }
        StorageType::Redis => {
            let backend = RedisBackend::connect(&config.redis_url)
                .await
                .with_context(|| format!("failed to connect to {}", config.redis_url))?;
            info!(url = %config.redis_url, "Connected to Redis backend");
            let backend: Arc<dyn KvBackend> = Arc::new(backend);
            Ok((backend, None))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
