use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediaferry_core::{
    load_config_or_default, validate_config, Catalog, ContentStore, FfmpegTranscoder,
    FsContentStore, IngestService, SqliteCatalogJournal, Transcoder,
};
use mediaferry_server::api::{create_ingest_router, create_router};
use mediaferry_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
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
    let config_path = std::env::var("MEDIAFERRY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Invalid configuration")?;

    info!(
        version = VERSION,
        workers = config.ingest.workers,
        queue_capacity = config.ingest.queue_capacity,
        ack_mode = ?config.ingest.ack_mode,
        "Starting mediaferry"
    );

    // Storage
    let store = Arc::new(FsContentStore::from_config(&config.storage));
    store
        .validate()
        .await
        .context("Failed to prepare storage directories")?;
    info!(
        upload_dir = %store.upload_dir().display(),
        preview_dir = %store.preview_dir().display(),
        "Storage ready"
    );

    // Preview derivation
    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    if let Err(e) = transcoder.validate().await {
        warn!("Preview derivation unavailable, uploads will be cataloged without previews: {}", e);
    }

    // Catalog, optionally journaled
    let catalog = match &config.storage.catalog_db {
        Some(db_path) => {
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create catalog directory {:?}", parent)
                    })?;
                }
            }
            let journal = SqliteCatalogJournal::new(db_path)
                .with_context(|| format!("Failed to open catalog database {:?}", db_path))?;
            let catalog = Catalog::with_journal(Arc::new(journal))
                .context("Failed to load catalog journal")?;
            info!(path = ?db_path, "Catalog journal opened");
            catalog
        }
        None => {
            info!("Catalog journal not configured, catalog is in-memory only");
            Catalog::new()
        }
    };

    let service = IngestService::new(config.ingest.clone(), store, transcoder)
        .with_preview_duration(config.transcoder.preview_duration())
        .with_catalog(catalog)
        .await;
    let service = Arc::new(service);
    service.start().await;

    // Create app state and routers
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&service)));
    let http_app = create_router(state.clone());
    let ingest_app = create_ingest_router(state);

    let http_addr = SocketAddr::new(config.server.host, config.server.http_port);
    let ingest_addr = SocketAddr::new(config.server.host, config.server.ingest_port);

    let http_listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", http_addr))?;
    let ingest_listener = tokio::net::TcpListener::bind(ingest_addr)
        .await
        .with_context(|| format!("Failed to bind ingest listener on {}", ingest_addr))?;
    info!("HTTP server listening on {}", http_addr);
    info!("Ingest server listening on {}", ingest_addr);

    // One signal stops both listeners
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let http_server = {
        let rx = shutdown_rx.clone();
        async move {
            axum::serve(http_listener, http_app)
                .with_graceful_shutdown(wait_for(rx))
                .await
                .context("HTTP server error")
        }
    };
    let ingest_server = async move {
        axum::serve(ingest_listener, ingest_app)
            .with_graceful_shutdown(wait_for(shutdown_rx))
            .await
            .context("Ingest server error")
    };

    let served = tokio::try_join!(http_server, ingest_server);

    // Drain admitted jobs before exiting
    info!("Stopping workers");
    service.shutdown().await;
    let status = service.status().await;
    info!(
        processed = status.workers.total_processed,
        failed = status.workers.total_failed,
        cataloged = status.catalog_entries,
        "Server stopped"
    );

    served.map(|_| ())
}

async fn wait_for(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
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
