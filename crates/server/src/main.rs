use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhirbridge_core::{
    create_pacs_client, dispatcher, load_config, validate_config, Img2DcmBuilder, SqliteTaskStore,
    TaskStore,
};

use fhirbridge_server::api::create_router;
use fhirbridge_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("FHIRBRIDGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("PACS send method: {}", config.pacs.send_method.as_str());

    // Create task store
    let task_store: Arc<dyn TaskStore> = match &config.database.path {
        Some(path) => {
            info!("Task store at {:?}", path);
            Arc::new(SqliteTaskStore::new(path).context("Failed to create task store")?)
        }
        None => {
            warn!("No database path configured; tasks live in memory and are lost on restart");
            Arc::new(SqliteTaskStore::in_memory().context("Failed to create task store")?)
        }
    };

    // Create DICOM builder and PACS transport
    let dicom_builder = Arc::new(Img2DcmBuilder::new(config.dicom.clone()));
    let pacs_client = create_pacs_client(&config.pacs).context("Failed to create PACS client")?;

    // Create dispatcher and spawn its worker
    let (dispatcher, worker) = dispatcher::channel(config.dispatcher.queue_size);
    let worker_handle = tokio::spawn(worker.run());
    info!(
        "Dispatcher started (queue size {})",
        config.dispatcher.queue_size
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);

    let state = Arc::new(AppState::new(
        config,
        Arc::clone(&task_store),
        dicom_builder,
        pacs_client,
        dispatcher,
    ));

    let app = create_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The router held the last dispatcher handle; once serve returns it is
    // dropped, so the worker drains queued jobs and exits.
    info!("Server stopped, draining dispatch queue");
    worker_handle.await.context("Dispatch worker panicked")?;

    task_store.teardown();
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
