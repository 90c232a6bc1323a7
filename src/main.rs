// SPDX-License-Identifier: MIT

//! Timetally API Server
//!
//! Serves the daily activity ledger: per-day activity logging against a
//! 1440-minute budget, with aggregated analytics per day.

use std::sync::Arc;
use std::time::Duration;

use timetally::{config::Config, db::FirestoreGateway, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Timetally API");

    // Initialize the Firestore sync gateway
    let gateway = FirestoreGateway::new(
        &config.gcp_project_id,
        Duration::from_secs(config.sync_poll_seconds),
    )
    .await
    .expect("Failed to connect to Firestore");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        gateway: Arc::new(gateway),
    });

    // Build router
    let app = timetally::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("timetally=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
