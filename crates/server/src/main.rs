use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use governor_core::{
    create_audit_system, load_config, validate_config, AuditEvent, AuditStore, BroadcastHub,
    EngineConfig, InMemoryAuditStore, InMemoryTicketStore, PipelineEngine, TicketStore,
};
use governor_server::api::create_router;
use governor_server::bootstrap::{build_registry, build_source};
use governor_server::state::AppState;

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
    let config_path = std::env::var("GOVERNOR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Processor mode: {}", config.pipeline.mode.as_str());

    // Compute config hash for the run log
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Create run log
    let audit_store: Arc<dyn AuditStore> = Arc::new(InMemoryAuditStore::with_capacity(
        config.pipeline.log_capacity,
    ));
    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), config.pipeline.log_buffer);

    // Spawn audit writer task
    let writer_handle = tokio::spawn(audit_writer.run());

    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
            mode: config.pipeline.mode.as_str().to_string(),
        })
        .await;

    // Create ticket store and broadcast hub
    let ticket_store: Arc<dyn TicketStore> = Arc::new(InMemoryTicketStore::new());
    let hub = Arc::new(BroadcastHub::new(
        Arc::clone(&ticket_store),
        config.pipeline.subscriber_buffer,
    ));

    // Create engine
    let registry = build_registry(&config, audit_handle.clone()).await?;
    let engine = PipelineEngine::new(
        EngineConfig::from(&config),
        ticket_store,
        registry,
        hub,
        Some(audit_handle.clone()),
    );

    // Load initial tickets
    let source = build_source(&config).await?;
    match engine.ingest(source.as_ref()).await {
        Ok(added) => info!("Loaded {} tickets", added.len()),
        Err(e) => warn!("Initial ticket load failed: {}", e),
    }

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), engine, audit_store));

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

    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // The writer stops once every AuditHandle is gone. The engine (and its
    // handle clones) went with the router.
    drop(audit_handle);
    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
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
