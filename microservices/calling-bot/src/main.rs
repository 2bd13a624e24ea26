//! Calling Bot Microservice
//!
//! Graph communications bot that exercises call control end to end:
//! - Outbound test calls with a delayed transfer
//! - Delayed participant invitation into a running call
//! - Joining scheduled Teams meetings from their join link
//! - Online meeting creation for the configured organizer
//! - Call state tracking from platform callback notifications

mod call_state;
mod config;
mod directory;
mod error;
mod handlers;
mod orchestrator;
mod routes;
mod scheduler;
mod telemetry;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use brivas_graph_sdk::{GraphClient, TeamsJoinUrlParser};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::CallingBotConfig;
use crate::directory::Role;
use crate::orchestrator::{CallOrchestrator, OrchestratorSettings};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: CallOrchestrator,
    pub started_at: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let telemetry = telemetry::TelemetryConfig::from_env();
    telemetry::init_tracing("calling-bot", &telemetry)?;

    info!("Starting Calling Bot microservice");

    // Load configuration
    let config = CallingBotConfig::from_env()?;
    let bind_addr = config.bind_address()?;

    let directory = config.directory();
    for role in Role::ALL {
        match directory.resolve(role) {
            Ok(user) => info!(role = %role, user_id = %user.id, "Role resolved"),
            Err(err) => warn!(
                role = %role,
                error = %err,
                "Role unresolved; actions needing it will fail"
            ),
        }
    }

    // Initialize Graph client
    let client = Arc::new(GraphClient::new(config.graph_config())?);

    let orchestrator = CallOrchestrator::new(
        client,
        Arc::new(TeamsJoinUrlParser),
        Arc::new(directory),
        OrchestratorSettings::from(&config),
    );

    info!(
        callback_uri = %config.callback_uri(),
        readiness = ?config.readiness,
        transfer_delay_secs = config.transfer_delay.as_secs(),
        invite_delay_secs = config.invite_delay.as_secs(),
        "Orchestrator ready"
    );

    // Build application state
    let state = AppState {
        orchestrator: orchestrator.clone(),
        started_at: Instant::now(),
    };

    let app = routes::create_router(state);

    // Start server
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Calling Bot listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let aborted = orchestrator.shutdown();
    info!(aborted_actions = aborted, "Calling Bot stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, gracefully stopping...");
}
