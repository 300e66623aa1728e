pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod monitoring;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

// Re-exports
pub use api::routes::{create_router, AppState};
pub use config::Settings;
pub use dashboard::{DashboardAggregator, DashboardOutcome, DashboardResponse};
pub use errors::{OrchestratorError, OrchestratorResult};

/// Binds `host:port` and serves the dashboard API until Ctrl-C or SIGTERM.
pub async fn run_server(settings: Settings, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_settings(&settings)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((settings.server.host.as_str(), port)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(
        metrics_url = %settings.upstream.metrics_url,
        anomaly_url = %settings.upstream.anomaly_url,
        "Metrics orchestrator listening on {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
