//! vidforge API server
//!
//! Process entry point: loads configuration, constructs the HTTP client and
//! storage collaborator once, injects them into the orchestrator, and serves
//! the render endpoint until shutdown.

mod error;
mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use vidforge_core::Config;
use vidforge_render::JobOrchestrator;
use vidforge_storage::create_storage;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Clients are constructed here, once, and injected downward; no component
    // owns a process-global.
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(15))
        .build()?;
    let storage = create_storage(&config.storage).await?;
    if let Some(storage) = &storage {
        tracing::info!(backend = ?storage.backend_type(), "storage collaborator configured");
    }

    let orchestrator = Arc::new(JobOrchestrator::new(&config, client, storage));
    let state = AppState::new(orchestrator, config.max_concurrent_jobs);

    let addr = format!("0.0.0.0:{}", config.server_port);
    tracing::info!(
        addr = %addr,
        engine_path = %config.engine_path,
        workspace_root = %config.workspace_root.display(),
        max_concurrent_jobs = config.max_concurrent_jobs,
        render_timeout_secs = config.render_timeout.as_secs(),
        "server ready and accepting render jobs"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, handlers::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Listens for Ctrl+C (SIGINT) and SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
