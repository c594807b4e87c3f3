//! MoltTip API server: accounts, posts, tips and leaderboards over HTTP.

pub mod auth;
pub mod config;
pub mod economy;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod snapshot;
pub mod state;
pub mod verifier;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

pub use config::{Args, ServerConfig};
pub use error::ApiError;
pub use state::AppState;

/// Serve the API on `listener` until `shutdown` resolves, then flush the
/// snapshot one last time.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = routes::router(state.clone())?;
    let maintenance = tokio::spawn(snapshot::run_maintenance(state.clone()));

    info!(addr = %listener.local_addr()?, "MoltTip API listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    maintenance.abort();
    if state.flush_snapshot().await? {
        info!("final snapshot written");
    }
    Ok(())
}
