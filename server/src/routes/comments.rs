use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use molttip_common::api::ContentRequest;
use molttip_common::comment::Comment;
use molttip_common::identity::PostId;

use super::{created, ok, ApiJson, ApiPath, ApiResult, Created};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/comments/{post_id}", get(list).post(add))
}

async fn list(
    State(state): State<Arc<AppState>>,
    ApiPath(post_id): ApiPath<PostId>,
) -> ApiResult<Vec<Comment>> {
    ok(state.economy.read().await.comments_for(&post_id)?)
}

async fn add(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiPath(post_id): ApiPath<PostId>,
    ApiJson(request): ApiJson<ContentRequest>,
) -> Created<Comment> {
    let comment = state
        .update(|economy| economy.add_comment(&auth.id, &post_id, &request.content))
        .await?;
    created("Comment added", comment)
}
