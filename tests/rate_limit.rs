mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use campusdesk::router::init_router;
use campusdesk_config::RateLimitConfig;
use common::{lazy_pool, test_state};

fn strict_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        general_per_second: 1,
        general_burst_size: 2,
        auth_per_second: 1,
        auth_burst_size: 1,
    }
}

fn refresh_request(client: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(
            serde_json::to_vec(&json!({ "refresh_token": "garbage" })).unwrap(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_auth_rate_limit_exceeded() {
    let app = init_router(test_state(lazy_pool()).with_rate_limit(strict_rate_limit_config()));

    // An invalid refresh token fails at verification, before any query.
    let first = app.clone().oneshot(refresh_request("10.0.0.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let second = app.clone().oneshot(refresh_request("10.0.0.1")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let app = init_router(test_state(lazy_pool()).with_rate_limit(strict_rate_limit_config()));

    let first = app.clone().oneshot(refresh_request("10.0.0.2")).await.unwrap();
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let other = app.clone().oneshot(refresh_request("10.0.0.3")).await.unwrap();
    assert_eq!(other.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_general_rate_limit_exceeded() {
    let app = init_router(test_state(lazy_pool()).with_rate_limit(strict_rate_limit_config()));

    let dashboard = || {
        Request::builder()
            .uri("/api/dashboard")
            .header("x-forwarded-for", "10.0.0.4")
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(dashboard()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let limited = app.clone().oneshot(dashboard()).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_disabled_rate_limit_never_rejects() {
    let config = RateLimitConfig {
        enabled: false,
        ..strict_rate_limit_config()
    };
    let app = init_router(test_state(lazy_pool()).with_rate_limit(config));

    for _ in 0..5 {
        let response = app.clone().oneshot(refresh_request("10.0.0.5")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
