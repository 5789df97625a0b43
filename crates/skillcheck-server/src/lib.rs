//! skillcheck-server — HTTP surface for the generation and evaluation pipeline.
//!
//! Endpoints are thin: they validate input, call into `skillcheck-core`, and
//! translate results and errors into JSON or a server-sent event stream.

pub mod error;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

pub use routes::build_router;
pub use state::AppState;

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid bind address: {addr}"))?;
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
