use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use molttip_common::api::{HealthStatus, PlatformStats};

use super::{ok, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
}

async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthStatus> {
    ok(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime().as_secs(),
    })
}

async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<PlatformStats> {
    ok(state.economy.read().await.stats())
}
