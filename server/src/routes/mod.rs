//! HTTP surface under `/api`.

mod accounts;
mod comments;
mod leaderboard;
mod notifications;
mod posts;
mod status;
mod tips;

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::{middleware, Json, Router};
use molttip_common::api::ApiResponse;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::rate_limit::limit_requests;
use crate::state::AppState;

/// JSON body whose rejection is reported in the response envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
pub type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

fn created<T>(message: &str, data: T) -> Created<T> {
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(message, data)),
    ))
}

pub fn router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let cors = cors_layer(state.config.frontend_origin.as_deref())?;

    let api = Router::new()
        .merge(status::routes())
        .merge(accounts::routes())
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(tips::routes())
        .merge(leaderboard::routes())
        .merge(notifications::routes())
        .layer(middleware::from_fn_with_state(state.clone(), limit_requests));

    Ok(Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ApiError> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ];
    let layer = match origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin.trim_end_matches('/'))
                .map_err(|e| ApiError::Config(format!("Invalid FRONTEND_ORIGIN: {e}")))?;
            CorsLayer::new()
                .allow_origin(origin)
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        }
        None => CorsLayer::new().allow_origin(Any).allow_headers(Any),
    };
    Ok(layer.allow_methods(methods))
}
