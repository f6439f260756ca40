//! Leave decisions, feedback replies and exam results against a real database.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use campusdesk::middleware::auth::AuthUser;
use campusdesk::modules::feedback::service::FeedbackService;
use campusdesk::modules::leave::service::LeaveService;
use campusdesk_auth::{CallerIdentity, Role};
use common::{classroom, create_user, send, test_app, token_for};

#[sqlx::test(migrations = "./migrations")]
async fn test_leave_is_decided_exactly_once(pool: PgPool) {
    let room = classroom(&pool, 1).await;
    let app = test_app(pool);
    let student = &room.students[0];

    let (status, request) = send(
        &app,
        Method::POST,
        "/api/leave",
        Some(&student.token()),
        Some(json!({ "leave_date": "2024-02-14", "reason": "Family wedding" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    assert_eq!(request["kind"], "student");

    let (status, queue) = send(
        &app,
        Method::GET,
        "/api/leave/queue?kind=student",
        Some(&room.admin.token()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue["meta"]["total"], 1);
    assert_eq!(queue["data"][0]["id"], request["id"]);

    let uri = format!("/api/leave/{}/decision", request["id"].as_str().unwrap());
    let (status, decided) = send(
        &app,
        Method::POST,
        &uri,
        Some(&room.admin.token()),
        Some(json!({ "outcome": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "approved");
    assert_eq!(decided["decided_by"], room.admin.id.to_string());

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&room.admin.token()),
        Some(json!({ "outcome": "reject" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_state");

    let (status, mine) = send(&app, Method::GET, "/api/leave/mine", Some(&student.token()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["status"], "approved");

    let (_, queue) = send(&app, Method::GET, "/api/leave/queue", Some(&room.admin.token()), None).await;
    assert_eq!(queue["meta"]["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deciding_unknown_leave_is_not_found(pool: PgPool) {
    let admin = create_user(&pool, Role::Administrator, "Head", "Office").await;
    let app = test_app(pool);

    let uri = format!("/api/leave/{}/decision", Uuid::new_v4());
    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&admin.token()),
        Some(json!({ "outcome": "reject" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_feedback_takes_a_single_reply(pool: PgPool) {
    let staff = create_user(&pool, Role::Staff, "Ada", "Lovelace").await;
    let admin = create_user(&pool, Role::Administrator, "Head", "Office").await;
    let app = test_app(pool);

    let (status, feedback) = send(
        &app,
        Method::POST,
        "/api/feedback",
        Some(&staff.token()),
        Some(json!({ "message": "The lab projector is broken" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(feedback["author_kind"], "staff");
    assert!(feedback["reply"].is_null());

    let uri = format!("/api/feedback/{}/reply", feedback["id"].as_str().unwrap());
    let (status, replied) = send(
        &app,
        Method::POST,
        &uri,
        Some(&admin.token()),
        Some(json!({ "reply": "A replacement is on its way" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replied["reply"], "A replacement is on its way");

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&admin.token()),
        Some(json!({ "reply": "Second answer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, mine) = send(&app, Method::GET, "/api/feedback/mine", Some(&staff.token()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["reply"], "A replacement is on its way");

    let (status, all) = send(
        &app,
        Method::GET,
        "/api/feedback?kind=student",
        Some(&admin.token()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["meta"]["total"], 0);

    let uri = format!("/api/feedback/{}/reply", Uuid::new_v4());
    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&admin.token()),
        Some(json!({ "reply": "Hello?" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_results_pass_at_forty(pool: PgPool) {
    let room = classroom(&pool, 1).await;
    let app = test_app(pool);
    let student = &room.students[0];

    let upsert = |marks: i32| {
        json!({ "student_id": student.id, "subject_id": room.subject_id, "marks": marks })
    };

    let (status, result) =
        send(&app, Method::PUT, "/api/results", Some(&room.staff.token()), Some(upsert(39))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["passed"], false);

    let (status, updated) =
        send(&app, Method::PUT, "/api/results", Some(&room.staff.token()), Some(upsert(40))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["passed"], true);
    assert_eq!(updated["id"], result["id"]);

    let (status, mine) =
        send(&app, Method::GET, "/api/results/mine", Some(&student.token()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["marks"], 40);

    let (status, _) =
        send(&app, Method::PUT, "/api/results", Some(&room.staff.token()), Some(upsert(101))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_results_require_enrollment_and_ownership(pool: PgPool) {
    let room = classroom(&pool, 1).await;
    let outsider = create_user(&pool, Role::Student, "Not", "Enrolled").await;
    let other_staff = create_user(&pool, Role::Staff, "Other", "Teacher").await;
    let app = test_app(pool);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/results",
        Some(&room.staff.token()),
        Some(json!({ "student_id": outsider.id, "subject_id": room.subject_id, "marks": 70 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/results",
        Some(&other_staff.token()),
        Some(json!({
            "student_id": room.students[0].id,
            "subject_id": room.subject_id,
            "marks": 70
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Staff listing must name one of their subjects.
    let (status, _) = send(&app, Method::GET, "/api/results", Some(&room.staff.token()), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let uri = format!("/api/results?student_id={}", outsider.id);
    let (status, _) = send(&app, Method::GET, &uri, Some(&room.students[0].token()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

async fn submit_leave(app: &axum::Router, token: &str) -> String {
    let (status, request) = send(
        app,
        Method::POST,
        "/api/leave",
        Some(token),
        Some(json!({ "leave_date": "2024-03-01", "reason": "Medical appointment" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    request["id"].as_str().unwrap().to_string()
}

async fn leave_status(pool: &PgPool, id: &str) -> String {
    sqlx::query_scalar("SELECT status::TEXT FROM leave_requests WHERE id = $1")
        .bind(Uuid::parse_str(id).unwrap())
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_racing_decisions_have_one_winner(pool: PgPool) {
    let room = classroom(&pool, 1).await;
    let app = test_app(pool.clone());
    let id = submit_leave(&app, &room.students[0].token()).await;

    let uri = format!("/api/leave/{id}/decision");
    let token = room.admin.token();
    let ((approve, approved), (reject, rejected)) = tokio::join!(
        send(&app, Method::POST, &uri, Some(&token), Some(json!({ "outcome": "approve" }))),
        send(&app, Method::POST, &uri, Some(&token), Some(json!({ "outcome": "reject" }))),
    );

    let statuses = [approve, reject];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 1);

    let winner = if approve == StatusCode::OK { approved } else { rejected };
    assert_eq!(leave_status(&pool, &id).await, winner["status"].as_str().unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_staff_decision_leaves_request_pending(pool: PgPool) {
    let room = classroom(&pool, 1).await;
    let app = test_app(pool.clone());
    let id = submit_leave(&app, &room.students[0].token()).await;

    let uri = format!("/api/leave/{id}/decision");
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&room.staff.token()),
        Some(json!({ "outcome": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    assert_eq!(leave_status(&pool, &id).await, "pending");
    let (_, mine) = send(
        &app,
        Method::GET,
        "/api/leave/mine",
        Some(&room.students[0].token()),
        None,
    )
    .await;
    assert_eq!(mine[0]["status"], "pending");
    assert!(mine[0]["decided_by"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_leave_reason_length_is_validated(pool: PgPool) {
    let student = create_user(&pool, Role::Student, "Alan", "Turing").await;
    let app = test_app(pool);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/leave",
        Some(&student.token()),
        Some(json!({ "leave_date": "2024-02-14", "reason": "x".repeat(2001) })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleted_account_token_is_unauthenticated(pool: PgPool) {
    let student = create_user(&pool, Role::Student, "Alan", "Turing").await;
    let app = test_app(pool.clone());
    let token = student.token();

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(student.id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/leave",
        Some(&token),
        Some(json!({ "leave_date": "2024-02-14", "reason": "Family wedding" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/feedback",
        Some(&token),
        Some(json!({ "message": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let (status, _) = send(&app, Method::GET, "/api/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let leave_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leave_requests")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(leave_rows, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_token_role_must_match_account(pool: PgPool) {
    let student = create_user(&pool, Role::Student, "Alan", "Turing").await;
    let app = test_app(pool);

    let forged = token_for(student.id, Role::Administrator);
    let (status, body) = send(&app, Method::GET, "/api/users", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let unknown = token_for(Uuid::new_v4(), Role::Administrator);
    let (status, _) = send(&app, Method::GET, "/api/courses", Some(&unknown), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_writes_for_a_vanished_caller_are_unauthenticated(pool: PgPool) {
    // The account disappears between the gate and the insert.
    let caller = AuthUser(CallerIdentity {
        id: Uuid::new_v4(),
        role: Role::Student,
    });

    let dto = serde_json::from_value(json!({ "leave_date": "2024-02-14", "reason": "Exam" })).unwrap();
    let err = LeaveService::submit(&pool, &caller, dto).await.unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);

    let dto = serde_json::from_value(json!({ "message": "Hello" })).unwrap();
    let err = FeedbackService::create(&pool, &caller, dto).await.unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
}
