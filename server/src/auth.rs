//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs carrying the user id. The [`AuthUser`] extractor
//! checks the token and that the user still exists.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use molttip_common::identity::UserId;
use molttip_common::user::User;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

const MIN_SECRET_LEN: usize = 32;

/// Payload stored in the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    #[serde(default)]
    pub agent: bool,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Clone)]
pub struct JwtIssuer {
    secret: String,
    expiry_seconds: u64,
}

impl JwtIssuer {
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, ApiError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(ApiError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }
        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    pub fn new_dev(expiry_seconds: u64) -> Self {
        Self {
            secret: "molttip-dev-secret-not-for-production-use".into(),
            expiry_seconds,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ApiError::Internal(format!("System time error: {e}")))?
            .as_secs();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            agent: user.is_agent(),
            iat: now,
            exp: now.saturating_add(self.expiry_seconds),
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|err| {
            let message = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid token signature",
                _ => "Invalid token",
            };
            ApiError::Unauthorized(message.into())
        })
    }
}

/// Pull the token out of an `Authorization: Bearer ...` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub claims: Claims,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()))?;
        let token = bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Malformed authorization header".into()))?;
        let claims = state.jwt.verify(token)?;
        let id = UserId::from(claims.sub.as_str());
        if state.economy.read().await.user(&id).is_err() {
            return Err(ApiError::Unauthorized("Unknown user".into()));
        }
        Ok(Self { id, claims })
    }
}
