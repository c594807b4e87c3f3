use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use molttip_common::api::TipRequest;
use molttip_common::identity::PostId;
use molttip_common::tip::{Tip, TipDraft};
use tracing::info;

use super::{created, ok, ApiJson, ApiPath, ApiResult, Created};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tips", post(send))
        .route("/tips/sent", get(sent))
        .route("/tips/received", get(received))
        .route("/tips/post/{post_id}", get(for_post))
}

async fn send(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(request): ApiJson<TipRequest>,
) -> Created<Tip> {
    let outcome = match TipDraft::parse(&request) {
        Ok(draft) => {
            state
                .update(|economy| economy.submit_tip(&auth.id, draft, state.verifier.as_ref()))
                .await
        }
        Err(rejection) => Err(rejection.into()),
    };
    match outcome {
        Ok(tip) => created("Tip sent", tip),
        Err(err) => {
            info!(sender = %auth.id, reason = %err, "tip rejected");
            Err(err)
        }
    }
}

async fn sent(State(state): State<Arc<AppState>>, auth: AuthUser) -> ApiResult<Vec<Tip>> {
    ok(state.economy.read().await.tips_sent(&auth.id))
}

async fn received(State(state): State<Arc<AppState>>, auth: AuthUser) -> ApiResult<Vec<Tip>> {
    ok(state.economy.read().await.tips_received(&auth.id))
}

async fn for_post(
    State(state): State<Arc<AppState>>,
    ApiPath(post_id): ApiPath<PostId>,
) -> ApiResult<Vec<Tip>> {
    ok(state.economy.read().await.tips_for_post(&post_id))
}
