//! The HTTP surface (spec §4.N): thin `axum` handlers over the
//! ingest/recall/repair/diagnostics crates. Grounded in the teacher's
//! MCP HTTP transport (`Router`, `AppState` behind an `Arc`,
//! `axum::serve` with `with_graceful_shutdown`), generalized from one
//! JSON-RPC endpoint to the full memory API named in spec §6.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

pub use router::build_router;
pub use state::{AppState, SharedState};

/// Bind and serve until `shutdown` fires, awaiting in-flight requests
/// to finish before returning (spec §5 "every background loop watches
/// a shutdown signal").
pub async fn serve(state: Arc<AppState>, addr: SocketAddr, mut shutdown: watch::Receiver<bool>) -> std::io::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "signet HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
            info!("HTTP server received shutdown signal");
        })
        .await?;

    info!("signet HTTP server shut down");
    Ok(())
}
