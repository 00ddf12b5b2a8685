//! lyrics-api - Song lyrics catalog service
//!
//! Serves the song CRUD API and pushes create/update notifications to
//! connected WebSocket and SSE clients.

use anyhow::{Context, Result};
use clap::Parser;
use lyrics_api::cli::Args;
use lyrics_api::db::{self, SqliteSongStore};
use lyrics_api::hub::BroadcastHub;
use lyrics_api::api::status::{BuildInfo, SERVICE_NAME};
use lyrics_api::{build_router, AppState};
use lyrics_common::config::{ensure_parent_dir, ServiceConfig, TomlConfig};
use lyrics_common::time::SystemClock;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lyrics_api=info,lyrics_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any slow startup work
    let build = BuildInfo::current();
    info!(
        "Starting {} v{} [{}] built {} ({})",
        SERVICE_NAME, build.version, build.git_hash, build.build_timestamp, build.build_profile
    );

    let args = Args::parse();
    let toml = TomlConfig::load_or_default(&args.config_path())
        .context("Failed to load config file")?;
    let config = ServiceConfig::resolve(args.overrides(), toml);

    ensure_parent_dir(&config.database_path)
        .context("Failed to create database directory")?;
    info!("Database path: {}", config.database_path.display());

    let pool = match db::connect(&config.database_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };
    db::init_schema(&pool)
        .await
        .context("Failed to initialize songs table")?;

    let hub = Arc::new(BroadcastHub::new(
        config.send_timeout,
        config.channel_capacity,
    ));
    let store = Arc::new(SqliteSongStore::new(pool));
    let state = AppState::new(store, hub, Arc::new(SystemClock))
        .with_cors_origins(config.cors_origins.clone());
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("lyrics-api listening on http://{}", addr);
    info!("Notifications: ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
