//! OCS dashboard server.
//!
//! Binds the API router and serves it until killed. Configuration comes
//! from the environment (a local `.env` is honored); see
//! [`ocs_dashboard::config`] for the variables.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use ocs_dashboard::client::OcsClient;
use ocs_dashboard::config::OcsConfig;
use ocs_dashboard::server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before touching the environment, so RUST_LOG set there
    // reaches the filter below.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "ocs_dashboard=info,tower_http=info".to_string()),
        )
        .init();

    let config = OcsConfig::from_env()?;
    info!("upstream configuration: {:?}", config);

    let client = Arc::new(OcsClient::new(&config)?);
    let state = AppState::new(client, &config);
    let app = create_router(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    info!("starting OCS dashboard server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
