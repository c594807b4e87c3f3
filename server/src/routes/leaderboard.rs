use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use molttip_common::leaderboard::{clamp_limit, LeaderboardEntry, LeaderboardMetric};
use serde::Deserialize;

use super::{ok, ApiQuery, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/leaderboard/top-earners", get(top_earners))
        .route("/leaderboard/top-tippers", get(top_tippers))
        .route("/leaderboard/agents", get(agents))
}

async fn top_earners(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    board(&state, LeaderboardMetric::TopEarners, query).await
}

async fn top_tippers(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    board(&state, LeaderboardMetric::TopTippers, query).await
}

async fn agents(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    board(&state, LeaderboardMetric::Agents, query).await
}

async fn board(
    state: &AppState,
    metric: LeaderboardMetric,
    query: LimitQuery,
) -> ApiResult<Vec<LeaderboardEntry>> {
    let limit = clamp_limit(query.limit);
    ok(state.economy.read().await.leaderboard(metric, limit))
}
