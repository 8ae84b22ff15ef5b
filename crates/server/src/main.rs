mod admin;
mod api;
mod app;
mod auth;
mod bootstrap;
mod cart;
mod checkout;
mod health;
mod payments;
mod state;
mod storefront;
mod templates;
mod tracking;
mod webhooks;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dropshop_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

use crate::payments::StripeGateway;
use crate::state::AppState;

fn init_logging(config: &AppConfig) {
    use dropshop_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging has to be up before bootstrap so its events are recorded.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let payments = StripeGateway::from_config(&app.config.payments, app.config.suppliers.timeout_secs)
        .context("payment gateway client could not be built")?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let drain = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let db_pool = app.db_pool.clone();
    let state = AppState::new(
        app.config,
        app.db_pool,
        templates::load(),
        app.suppliers,
        Arc::new(payments),
    );

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        address = %address,
        "dropshop-server listening"
    );

    axum::serve(listener, app::build(state)).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "dropshop-server stopping"
    );
    if tokio::time::timeout(drain, db_pool.close()).await.is_err() {
        tracing::warn!(
            event_name = "system.server.drain_timeout",
            correlation_id = "shutdown",
            "database pool did not close before the drain timeout"
        );
    }

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_failed",
            error = %error,
            "could not listen for shutdown signal"
        );
    }
}
