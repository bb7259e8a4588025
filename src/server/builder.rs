//! Serving the fee router

use super::router::build_router;
use crate::config::FeeConfig;
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve the fee endpoints with graceful shutdown
///
/// This will:
/// - Bind to the provided address
/// - Start serving requests
/// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
///
/// # Example
///
/// ```ignore
/// let config = FeeConfig::from_yaml_file("fees.yaml")?;
/// midaz_fees::server::serve(config, "127.0.0.1:3000").await?;
/// ```
pub async fn serve(config: FeeConfig, addr: &str) -> Result<()> {
    let app = build_router(Arc::new(config))?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Fee server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
