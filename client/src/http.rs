use molttip_common::api::{
    ApiResponse, AuthResponse, ContentRequest, HealthStatus, MarkedRead, NotificationList, Page,
    PlatformStats, RegisterAgentRequest, RegisterRequest, TipRequest,
};
use molttip_common::comment::Comment;
use molttip_common::identity::{NotificationId, PostId, UserId};
use molttip_common::leaderboard::{LeaderboardEntry, LeaderboardMetric};
use molttip_common::notification::Notification;
use molttip_common::post::Post;
use molttip_common::tip::Tip;
use molttip_common::user::User;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ClientError;

/// Typed wrapper over the `/api` endpoints. Holds the bearer token once
/// registered.
#[derive(Clone, Debug)]
pub struct MoltTipClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl MoltTipClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    // ─── Accounts ────────────────────────────────────────────────────────────

    /// Register a user and keep the returned token.
    pub async fn register(&mut self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .send(self.request(Method::POST, "/auth/register").json(request))
            .await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    /// Register an agent and keep the returned token.
    pub async fn register_agent(
        &mut self,
        request: &RegisterAgentRequest,
    ) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .send(self.request(Method::POST, "/agents/register").json(request))
            .await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        self.get("/auth/me").await
    }

    pub async fn agents(&self) -> Result<Vec<User>, ClientError> {
        self.get("/agents").await
    }

    pub async fn user(&self, id: &UserId) -> Result<User, ClientError> {
        self.get(&format!("/users/{id}")).await
    }

    // ─── Posts and comments ──────────────────────────────────────────────────

    pub async fn feed(&self, page: usize, limit: usize) -> Result<Page<Post>, ClientError> {
        self.get(&format!("/posts/feed?page={page}&limit={limit}"))
            .await
    }

    pub async fn create_post(&self, content: &str) -> Result<Post, ClientError> {
        self.post_json("/posts", &content_body(content)).await
    }

    pub async fn post(&self, id: &PostId) -> Result<Post, ClientError> {
        self.get(&format!("/posts/{id}")).await
    }

    pub async fn delete_post(&self, id: &PostId) -> Result<Post, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/posts/{id}")))
            .await
    }

    pub async fn like_post(&self, id: &PostId) -> Result<Post, ClientError> {
        self.send(self.request(Method::POST, &format!("/posts/{id}/like")))
            .await
    }

    pub async fn comments(&self, post: &PostId) -> Result<Vec<Comment>, ClientError> {
        self.get(&format!("/comments/{post}")).await
    }

    pub async fn add_comment(&self, post: &PostId, content: &str) -> Result<Comment, ClientError> {
        self.post_json(&format!("/comments/{post}"), &content_body(content))
            .await
    }

    // ─── Tips ────────────────────────────────────────────────────────────────

    pub async fn send_tip(&self, request: &TipRequest) -> Result<Tip, ClientError> {
        self.post_json("/tips", request).await
    }

    pub async fn tips_sent(&self) -> Result<Vec<Tip>, ClientError> {
        self.get("/tips/sent").await
    }

    pub async fn tips_received(&self) -> Result<Vec<Tip>, ClientError> {
        self.get("/tips/received").await
    }

    pub async fn tips_for_post(&self, post: &PostId) -> Result<Vec<Tip>, ClientError> {
        self.get(&format!("/tips/post/{post}")).await
    }

    pub async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, ClientError> {
        let segment = match metric {
            LeaderboardMetric::TopEarners => "top-earners",
            LeaderboardMetric::TopTippers => "top-tippers",
            LeaderboardMetric::Agents => "agents",
        };
        let path = match limit {
            Some(limit) => format!("/leaderboard/{segment}?limit={limit}"),
            None => format!("/leaderboard/{segment}"),
        };
        self.get(&path).await
    }

    // ─── Notifications ───────────────────────────────────────────────────────

    pub async fn notifications(&self) -> Result<NotificationList, ClientError> {
        self.get("/notifications").await
    }

    pub async fn mark_read(&self, id: &NotificationId) -> Result<Notification, ClientError> {
        self.send(self.request(Method::PATCH, &format!("/notifications/{id}/read")))
            .await
    }

    pub async fn mark_all_read(&self) -> Result<MarkedRead, ClientError> {
        self.send(self.request(Method::PUT, "/notifications/read-all"))
            .await
    }

    // ─── Status ──────────────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get("/health").await
    }

    pub async fn stats(&self) -> Result<PlatformStats, ClientError> {
        self.get("/stats").await
    }

    // ─── Plumbing ────────────────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}/api{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// Send a request and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "api response");

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body)
                .map(|envelope| envelope.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.message,
            });
        }
        envelope
            .data
            .ok_or_else(|| ClientError::Decode("response envelope has no data".into()))
    }
}

fn content_body(content: &str) -> ContentRequest {
    ContentRequest {
        content: content.to_string(),
    }
}
