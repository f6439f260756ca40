//! Per-client token buckets.
//!
//! Clients are keyed by the first `X-Forwarded-For` address when present,
//! otherwise by the peer address from [`ConnectInfo`].

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use campusdesk_config::RateLimitConfig;
use campusdesk_core::AppError;

use crate::state::AppState;

pub struct RateLimiters {
    general: Option<DefaultKeyedRateLimiter<String>>,
    auth: Option<DefaultKeyedRateLimiter<String>>,
}

impl std::fmt::Debug for RateLimiters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiters")
            .field("general", &self.general.is_some())
            .field("auth", &self.auth.is_some())
            .finish()
    }
}

fn keyed(quota: Option<Quota>) -> Option<DefaultKeyedRateLimiter<String>> {
    quota.map(RateLimiter::keyed)
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: keyed(config.general_quota()),
            auth: keyed(config.auth_quota()),
        }
    }

    pub fn check_general(&self, client: &str) -> bool {
        check(self.general.as_ref(), client)
    }

    pub fn check_auth(&self, client: &str) -> bool {
        check(self.auth.as_ref(), client)
    }

    /// Forgets clients whose buckets have fully refilled.
    pub fn retain_recent(&self) {
        if let Some(limiter) = &self.general {
            limiter.retain_recent();
        }
        if let Some(limiter) = &self.auth {
            limiter.retain_recent();
        }
    }
}

fn check(limiter: Option<&DefaultKeyedRateLimiter<String>>, client: &str) -> bool {
    match limiter {
        Some(limiter) => limiter.check_key(&client.to_string()).is_ok(),
        None => true,
    }
}

pub fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn rejected(client: &str, bucket: &str) -> Response {
    tracing::warn!(client = %client, bucket, "Rate limit exceeded");
    AppError::too_many_requests("Too many requests, slow down").into_response()
}

pub async fn general_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);
    if !state.rate_limiters.check_general(&client) {
        return rejected(&client, "general");
    }
    next.run(req).await
}

pub async fn auth_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let client = client_key(&req);
    if !state.rate_limiters.check_auth(&client) {
        return rejected(&client, "auth");
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn config(burst: u32) -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            general_per_second: 1,
            general_burst_size: burst,
            auth_per_second: 1,
            auth_burst_size: burst,
        }
    }

    #[test]
    fn test_burst_then_reject() {
        let limiters = RateLimiters::new(&config(2));
        assert!(limiters.check_general("10.0.0.1"));
        assert!(limiters.check_general("10.0.0.1"));
        assert!(!limiters.check_general("10.0.0.1"));
    }

    #[test]
    fn test_clients_have_separate_buckets() {
        let limiters = RateLimiters::new(&config(1));
        assert!(limiters.check_auth("10.0.0.1"));
        assert!(limiters.check_auth("10.0.0.2"));
        assert!(!limiters.check_auth("10.0.0.1"));
    }

    #[test]
    fn test_disabled_always_allows() {
        let limiters = RateLimiters::new(&RateLimitConfig {
            enabled: false,
            ..config(1)
        });
        for _ in 0..100 {
            assert!(limiters.check_general("10.0.0.1"));
        }
    }

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_unknown() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&req), "unknown");
    }
}
