mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

use campusdesk_auth::Role;
use common::{TEST_PASSWORD, create_user, generate_unique_email, send, test_app};

#[sqlx::test(migrations = "./migrations")]
async fn test_register_takes_role_from_email_tag(pool: PgPool) {
    let app = test_app(pool);
    let email = generate_unique_email("student");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": email,
            "password": TEST_PASSWORD
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "student");
    assert_eq!(body["email"], email);
    assert!(body.get("password").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_rejects_untagged_and_duplicate_emails(pool: PgPool) {
    let app = test_app(pool);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "first_name": "No",
            "last_name": "Tag",
            "email": "notag@campus.test",
            "password": TEST_PASSWORD
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");

    let email = generate_unique_email("staff");
    let register = json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": email,
        "password": TEST_PASSWORD
    });
    let (status, _) = send(&app, Method::POST, "/api/auth/register", None, Some(register.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/api/auth/register", None, Some(register)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_state");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_tag_cannot_self_register(pool: PgPool) {
    let app = test_app(pool);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "first_name": "Would",
            "last_name": "Be",
            "email": generate_unique_email("hod"),
            "password": TEST_PASSWORD
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_and_refresh(pool: PgPool) {
    let staff = create_user(&pool, Role::Staff, "Ada", "Lovelace").await;
    let app = test_app(pool);

    let (status, login) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": staff.email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["landing"], "staff");
    assert_eq!(login["token_type"], "Bearer");
    assert_eq!(login["user"]["id"], staff.id.to_string());

    // The access token works against a protected route.
    let access = login["access_token"].as_str().unwrap();
    let (status, profile) = send(&app, Method::GET, "/api/profile", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["landing"], "staff");

    let (status, refreshed) = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": login["refresh_token"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["access_token"].as_str().is_some());

    // A refresh token is not an access token.
    let refresh = login["refresh_token"].as_str().unwrap();
    let (status, _) = send(&app, Method::GET, "/api/profile", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    let student = create_user(&pool, Role::Student, "Alan", "Turing").await;
    let app = test_app(pool);

    for email in [student.email.as_str(), "nobody.student@campus.test"] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");
    }
}
