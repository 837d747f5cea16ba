//! HTTP server for station uploads.

mod shutdown;
mod state;

pub use shutdown::shutdown_signal;
pub use state::BridgeState;

use std::future::Future;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use wxbridge_core::BridgeConfig;
use wxbridge_publishers::UPDATE_PATH;

use crate::handlers::{basic, station};

/// Build the router.
///
/// The upload path is the one station firmware is hard-wired to; both
/// GET and POST are accepted, the data is always in the query string.
pub fn create_router(state: BridgeState) -> Router {
    Router::new()
        .route(
            UPDATE_PATH,
            get(station::update_handler).post(station::update_handler),
        )
        .route("/api/health", get(basic::health_handler))
        .with_state(state)
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: BridgeState,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state.clone());
    let addr = listener.local_addr()?;

    tracing::info!(addr = %addr, path = UPDATE_PATH, "Listening for station uploads");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    state.shutdown();
    tracing::info!("Server stopped");
    Ok(())
}

/// Build the backend from `config` and serve until Ctrl+C or SIGTERM.
pub async fn run(config: &BridgeConfig) -> anyhow::Result<()> {
    let addr = config.server.bind_addr();
    let state = BridgeState::from_config(config)?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    serve_with_shutdown(listener, state, shutdown_signal()).await
}
