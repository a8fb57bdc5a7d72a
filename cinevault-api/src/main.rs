//! # CineVault API Server
//!
//! HTTP backend for the CineVault video subscription service: account
//! registration and login, subscription purchase and cancellation, and the
//! payment provider webhook.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p cinevault-api
//! ```

use std::sync::Arc;

use cinevault_api::app::{build_router, AppState};
use cinevault_api::config::Config;
use cinevault_shared::db::pool::{create_pool, DatabaseConfig};
use cinevault_shared::store::postgres::{PgAppStore, PgIdentityStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinevault_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "CineVault API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    let identity = Arc::new(PgIdentityStore::new(pool.clone()));
    let store = Arc::new(PgAppStore::new(pool.clone()));

    let state = AppState::new(pool, identity, store, config);

    // Seed the allow-listed admin account when a password is configured
    if let Some(password) = state.config.auth.admin_password.clone() {
        if let Err(err) = state.auth.provision_admin(&password).await {
            tracing::warn!(error = %err, "admin provisioning failed");
        }
    }

    let bind_address = state.config.bind_address();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown handler");
    } else {
        tracing::info!("Shutdown signal received");
    }
}
