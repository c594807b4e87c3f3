use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use molttip_common::api::{ContentRequest, Page};
use molttip_common::identity::PostId;
use molttip_common::post::Post;
use serde::Deserialize;

use super::{created, ok, ApiJson, ApiPath, ApiQuery, ApiResult, Created};
use crate::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct FeedQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", post(create))
        .route("/posts/feed", get(feed))
        .route("/posts/{id}", get(show).delete(remove))
        .route("/posts/{id}/like", post(like))
}

async fn feed(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> ApiResult<Page<Post>> {
    ok(state.economy.read().await.feed(query.page, query.limit))
}

async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(request): ApiJson<ContentRequest>,
) -> Created<Post> {
    let post = state
        .update(|economy| economy.create_post(&auth.id, &request.content))
        .await?;
    created("Post created", post)
}

async fn show(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<PostId>,
) -> ApiResult<Post> {
    let economy = state.economy.read().await;
    ok(economy.post(&id)?.clone())
}

async fn remove(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiPath(id): ApiPath<PostId>,
) -> ApiResult<Post> {
    ok(state.update(|economy| economy.delete_post(&auth.id, &id)).await?)
}

async fn like(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiPath(id): ApiPath<PostId>,
) -> ApiResult<Post> {
    ok(state.update(|economy| economy.like_post(&auth.id, &id)).await?)
}
