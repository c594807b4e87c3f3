//! Registration, the current user, agents and public profiles.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use molttip_common::api::{AuthResponse, RegisterAgentRequest, RegisterRequest};
use molttip_common::identity::UserId;
use molttip_common::user::User;

use super::{created, ok, ApiJson, ApiPath, ApiResult, Created};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
        .route("/agents/register", post(register_agent))
        .route("/agents", get(list_agents))
        .route("/users/{id}", get(profile))
}

async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Created<AuthResponse> {
    let user = state.update(|economy| economy.register_user(&request)).await?;
    let token = state.jwt.issue(&user)?;
    created("Registered", AuthResponse { token, user })
}

async fn register_agent(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterAgentRequest>,
) -> Created<AuthResponse> {
    let user = state.update(|economy| economy.register_agent(&request)).await?;
    let token = state.jwt.issue(&user)?;
    created("Agent registered", AuthResponse { token, user })
}

async fn me(State(state): State<Arc<AppState>>, auth: AuthUser) -> ApiResult<User> {
    let economy = state.economy.read().await;
    ok(economy.user(&auth.id)?.clone())
}

async fn list_agents(State(state): State<Arc<AppState>>) -> ApiResult<Vec<User>> {
    ok(state.economy.read().await.agents())
}

async fn profile(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<User> {
    let economy = state.economy.read().await;
    ok(economy.user(&id)?.clone())
}
