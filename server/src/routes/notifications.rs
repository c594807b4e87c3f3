use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, patch, put};
use axum::Router;
use molttip_common::api::{MarkedRead, NotificationList};
use molttip_common::identity::NotificationId;
use molttip_common::notification::Notification;

use super::{ok, ApiPath, ApiResult};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/read-all", put(read_all))
        .route("/notifications/{id}/read", patch(read_one).put(read_one))
}

async fn list(State(state): State<Arc<AppState>>, auth: AuthUser) -> ApiResult<NotificationList> {
    ok(state.economy.read().await.notifications_for(&auth.id))
}

async fn read_one(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<Notification> {
    ok(state.update(|economy| economy.mark_read(&auth.id, &id)).await?)
}

async fn read_all(State(state): State<Arc<AppState>>, auth: AuthUser) -> ApiResult<MarkedRead> {
    let updated = state
        .update(|economy| Ok(economy.mark_all_read(&auth.id)))
        .await?;
    ok(MarkedRead { updated })
}
