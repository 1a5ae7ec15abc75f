use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pngflow_core::{
    load_config, validate_config, CompletionAggregator, Config, EventPipeline, GcsStorage,
    GhostscriptRasterizer, ItemStore, ItemStoreBackendKind, LocalStorage, ObjectStorage,
    Rasterizer, RealtimeDbItemStore, RenderOptions, SanitizedConfig, SqliteItemStore,
    StorageBackendKind, WebhookNotifier,
};

use pngflow_server::api::create_router;
use pngflow_server::state::AppState;

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
    let config_path = std::env::var("PNGFLOW_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Fingerprint the effective config for log correlation across instances
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let sanitized = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded: {}",
        sanitized
    );

    tokio::fs::create_dir_all(&config.pipeline.workspace_root)
        .await
        .with_context(|| {
            format!(
                "Failed to create workspace root {:?}",
                config.pipeline.workspace_root
            )
        })?;

    let pipeline = Arc::new(build_pipeline(&config).await?);
    let state = Arc::new(AppState::new(config.clone(), pipeline));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Constructs the process-wide collaborators and the event pipeline.
async fn build_pipeline(config: &Config) -> Result<EventPipeline> {
    let storage: Arc<dyn ObjectStorage> = match config.storage.backend {
        StorageBackendKind::Gcs => {
            let gcs_config = config.storage.gcs.clone().unwrap_or_default();
            info!("Initializing Cloud Storage client at {}", gcs_config.endpoint);
            Arc::new(GcsStorage::new(gcs_config).context("Failed to create storage client")?)
        }
        StorageBackendKind::Local => {
            let local = config
                .storage
                .local
                .as_ref()
                .ok_or_else(|| anyhow!("local storage backend selected but no [storage.local] section"))?;
            info!("Using local storage rooted at {:?}", local.root);
            Arc::new(LocalStorage::from_config(local))
        }
    };

    let rasterizer = GhostscriptRasterizer::new(config.rasterizer.clone());
    match rasterizer.validate().await {
        Ok(()) => info!("Rasterizer ready: {}", config.rasterizer.gs_path.display()),
        Err(e) => warn!("Rasterizer unavailable, conversions will fail: {}", e),
    }
    let render_options = RenderOptions::from(rasterizer.config());
    let rasterizer: Arc<dyn Rasterizer> = Arc::new(rasterizer);

    let item_store: Arc<dyn ItemStore> = match config.item_store.backend {
        ItemStoreBackendKind::RealtimeDb => {
            let rtdb = config
                .item_store
                .realtime_db
                .clone()
                .ok_or_else(|| anyhow!("realtime_db backend selected but no [item_store.realtime_db] section"))?;
            info!("Using Realtime Database item store at {}", rtdb.url);
            Arc::new(RealtimeDbItemStore::new(rtdb).context("Failed to create item store")?)
        }
        ItemStoreBackendKind::Sqlite => {
            let path = &config.item_store.sqlite.path;
            info!("Using SQLite item store at {:?}", path);
            Arc::new(SqliteItemStore::new(path).context("Failed to open SQLite item store")?)
        }
    };

    let exactly_once = config.notifier.as_ref().map_or(true, |n| n.exactly_once);
    let aggregator = CompletionAggregator::new(item_store, config.item_store.approved_status.clone())
        .with_exactly_once(exactly_once);

    let pipeline = EventPipeline::new(
        config.pipeline.clone(),
        storage,
        rasterizer,
        render_options,
        aggregator,
    );

    match &config.notifier {
        Some(notifier_config) => {
            let notifier = WebhookNotifier::new(notifier_config.clone())
                .context("Failed to create webhook notifier")?;
            info!(
                exactly_once,
                "Completion webhook configured for workflow {}", notifier_config.workflow_id
            );
            Ok(pipeline.with_notifier(Arc::new(notifier)))
        }
        None => {
            info!("No notifier configured; completed orders are only logged");
            Ok(pipeline)
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
