mod router;
mod state;

pub use router::build_router;
pub use state::{AppState, ServeHealth};

use crate::errors::GatewayError;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Serves until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        GatewayError::startup(&format!("bind {addr}: {e}"))
    })?;
    state.health.mark_live();
    tracing::info!(%addr, operations = state.table.len(), "rackgate listening");

    let health = state.health.clone();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
            health.mark_unready("shutting down");
            tracing::info!("shutdown requested");
        })
        .await
        .map_err(|e| GatewayError::startup(&format!("server error: {e}")))
}
