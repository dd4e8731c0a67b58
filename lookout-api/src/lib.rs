//! # Lookout HTTP Control Surface
//!
//! Live-capture control (`/start_live`, `/stop_live`, `/live_status`),
//! one-shot analysis (`/predict` and its aliases, `/download/:filename`) and
//! service endpoints (`/`, `/health`, `/metrics`).

pub mod error;
pub mod routes;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;

use tracing::info;

pub use error::ApiError;
pub use routes::router;
pub use state::ApiState;

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<F>(state: ApiState, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
