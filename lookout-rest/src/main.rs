//! lookout REST API Server
//!
//! Serves the status, control, and log-stream endpoints for the lookout
//! dashboard.
//!
//! # Environment Variables
//!
//! - `LOOKOUT_CONFIG`: path to a TOML config file (default: `./lookout.toml` when present)
//! - `LOOKOUT_HOST` / `LOOKOUT_PORT`: listener overrides
//! - `LOOKOUT_FEED_INTERVAL_SECS`: synthetic log feed period

use lookout_core::{Config, spawn_feed};
use lookout_rest::{AppState, router};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lookout_rest=info,lookout_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load layered configuration (defaults -> file -> env)
    let config = Config::load().await?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        adapters = config.adapters.len(),
        feed_interval_secs = config.feed.interval_secs,
        "Starting lookout REST server"
    );

    // Build app state and start the synthetic log feed
    let state = AppState::from_config(&config);
    let feed = spawn_feed(
        state.broadcaster.clone(),
        Duration::from_secs(config.feed.interval_secs),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| format!("Invalid host:port combination: {}", e))?;

    // Build router with middleware
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Listening on http://{}", addr);

    // Run server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    feed.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
