//! Rally Relay server binary

mod config;
mod telemetry;

use anyhow::Context;
use clap::Parser;
use rally_relay_api::{build_router, AppState, CorsConfig};
use rally_relay_db::{resolve_database_url, SqlStatusStore, StoreOptions};
use rally_relay_service::{EnvCredentials, ServiceRegistry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = ServerConfig::parse();
    telemetry::init(&config.log_level, config.log_json)?;

    let database_url = resolve_database_url(&config.database_url, config.db_name.as_deref())?;
    let store = SqlStatusStore::connect(
        &StoreOptions::new(database_url).with_max_connections(config.db_max_connections),
    )
    .await
    .context("failed to connect to the status store")?;

    let services = ServiceRegistry::new(Arc::new(store.clone()), Arc::new(EnvCredentials));
    let cors = CorsConfig::from_list(&config.cors_origins);
    let app = build_router(AppState::new(services), &cors);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, origins = ?cors.origins, "Rally Relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
