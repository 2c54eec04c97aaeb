//! Convertly Server — asynchronous document and image conversion.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use convertly_core::config::AppConfig;
use convertly_core::error::AppError;
use convertly_core::traits::ObjectStore;
use convertly_database::{JobStore, MemoryJobStore, PgJobStore};
use convertly_entity::JobFamily;
use convertly_storage::LocalObjectStore;
use convertly_worker::transform::{DocumentTransformer, ImageTransformer};
use convertly_worker::{JobDispatcher, WorkerPool};

#[tokio::main]
async fn main() {
    let env = std::env::var("CONVERTLY_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Convertly v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Job record store ─────────────────────────────────
    let job_store: Arc<dyn JobStore> = match config.database.mode.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory job store; records are lost on restart");
            Arc::new(MemoryJobStore::new())
        }
        _ => {
            tracing::info!("Connecting to database...");
            let db_pool = convertly_database::connection::create_pool(&config.database).await?;
            convertly_database::migration::run_migrations(&db_pool).await?;
            Arc::new(PgJobStore::new(db_pool))
        }
    };

    // ── Step 2: Object storage ───────────────────────────────────
    let object_store: Arc<dyn ObjectStore> =
        Arc::new(LocalObjectStore::new(&config.storage.root).await?);
    tracing::info!(root = %config.storage.root, "Object storage initialized");

    // ── Step 3: Worker pools ─────────────────────────────────────
    let document_transformer = Arc::new(DocumentTransformer::new(
        Arc::clone(&object_store),
        config.storage.office_command.clone(),
        Duration::from_secs(config.storage.convert_timeout_seconds),
    ));
    let image_transformer = Arc::new(ImageTransformer::new(Arc::clone(&object_store)));

    let document_pool = Arc::new(WorkerPool::new(
        JobFamily::Document,
        &config.worker.document,
        document_transformer,
    ));
    let image_pool = Arc::new(WorkerPool::new(
        JobFamily::Image,
        &config.worker.image,
        image_transformer,
    ));

    // ── Step 4: Dispatcher ───────────────────────────────────────
    let dispatcher = Arc::new(JobDispatcher::new(
        Arc::clone(&job_store),
        document_pool,
        image_pool,
    ));

    // ── Step 5: Build and start HTTP server ──────────────────────
    let app_state = convertly_api::state::AppState {
        config: Arc::new(config.clone()),
        dispatcher,
        job_store,
        object_store,
    };

    let app = convertly_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Convertly server listening on {addr}");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Convertly server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
