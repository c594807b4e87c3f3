//! Per-client sliding-window request limiting.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

pub struct RateLimiter {
    /// Request times per client in the current window.
    requests: DashMap<IpAddr, Vec<Instant>>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            requests: DashMap::new(),
            window,
            max_requests,
        }
    }

    /// Check if a request is allowed and record it.
    pub fn check_and_record(&self, client: IpAddr) -> bool {
        self.check_and_record_at(client, Instant::now())
    }

    fn check_and_record_at(&self, client: IpAddr, now: Instant) -> bool {
        let mut entry = self.requests.entry(client).or_default();
        entry.retain(|&at| now.saturating_duration_since(at) < self.window);
        if entry.len() >= self.max_requests as usize {
            return false;
        }
        entry.push(now);
        true
    }

    /// Drop clients with no requests left in the window.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.requests.retain(|_, times| {
            times.retain(|&at| now.saturating_duration_since(at) < self.window);
            !times.is_empty()
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.requests.len()
    }
}

/// Middleware rejecting clients over their budget with 429.
pub async fn limit_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    if !state.limiter.check_and_record(client) {
        debug!(%client, path = %request.uri().path(), "rate limited");
        return ApiError::TooManyRequests.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn blocks_after_max_requests() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_and_record_at(ip(1), now));
        }
        assert!(!limiter.check_and_record_at(ip(1), now));
        assert!(limiter.check_and_record_at(ip(2), now));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let start = Instant::now();
        assert!(limiter.check_and_record_at(ip(1), start));
        assert!(!limiter.check_and_record_at(ip(1), start + Duration::from_secs(59)));
        assert!(limiter.check_and_record_at(ip(1), start + Duration::from_secs(61)));
    }

    #[test]
    fn cleanup_forgets_idle_clients() {
        let limiter = RateLimiter::new(Duration::from_millis(1), 10);
        assert!(limiter.check_and_record(ip(1)));
        std::thread::sleep(Duration::from_millis(5));
        limiter.cleanup();
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
