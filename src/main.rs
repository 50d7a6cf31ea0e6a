use std::net::SocketAddr;

use fleet_collector::{AppState, Config, Result, create_router, start_background_tasks};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    setup_tracing();

    let config = Config::from_env();
    tracing::info!(
        "Loaded configuration: listening on {}, data dir {}",
        config.server_addr,
        config.data_dir.display()
    );

    let state = AppState::from_config(config);

    // Bootstrap the append-only logs before anything reads them.
    state.storage.ensure_files().await.map_err(|e| {
        tracing::error!("Failed to initialize data directory: {}", e);
        e
    })?;

    // Shutdown channel (graceful shutdown on Ctrl+C)
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    start_background_tasks(shutdown_rx.clone(), state.clone());

    let app = create_router(state.clone());

    let addr: SocketAddr = state.config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("Fleet collector starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET  /heartbeat   - client liveness report");
    tracing::info!("  - GET  /api/status  - aggregated fleet view");
    tracing::info!("  - GET  /            - HTML dashboard");
    tracing::info!("  - GET  /server      - network scan report");
    tracing::info!("  - POST /feedback    - feedback log");

    let mut shutdown_rx = shutdown_rx;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
        tracing::info!("HTTP server shutting down");
    })
    .await
    .map_err(|e| {
        tracing::error!("Server error: {}", e);
        e
    })?;

    Ok(())
}

fn setup_tracing() {
    // Honor RUST_LOG when set, default to "info" otherwise.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
