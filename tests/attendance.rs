mod common;

use axum::Router;
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use campusdesk_auth::Role;
use common::{Classroom, classroom, create_subject, create_user, send, test_app};

const DAY: &str = "2024-01-10";

fn mark_body(room: &Classroom, date: &str, present: &[bool]) -> Value {
    let entries: Vec<Value> = room
        .students
        .iter()
        .zip(present)
        .map(|(student, present)| json!({ "student_id": student.id, "present": present }))
        .collect();
    json!({
        "subject_id": room.subject_id,
        "session_id": room.session_id,
        "date": date,
        "entries": entries
    })
}

async fn subject_summary(app: &Router, room: &Classroom) -> Value {
    let uri = format!(
        "/api/attendance/summary?subject_id={}&session_id={}",
        room.subject_id, room.session_id
    );
    let (status, body) = send(app, Method::GET, &uri, Some(&room.staff.token()), None).await;
    assert_eq!(status, StatusCode::OK);
    body
}

fn row_for<'a>(summary: &'a Value, student_id: Uuid) -> &'a Value {
    summary["students"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["student_id"] == student_id.to_string())
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_then_summarize(pool: PgPool) {
    let room = classroom(&pool, 5).await;
    let app = test_app(pool);

    let (status, ack) = send(
        &app,
        Method::POST,
        "/api/attendance",
        Some(&room.staff.token()),
        Some(mark_body(&room, DAY, &[true, true, true, false, false])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["present"], 3);
    assert_eq!(ack["absent"], 2);

    let summary = subject_summary(&app, &room).await;
    assert_eq!(summary["students"].as_array().unwrap().len(), 5);

    let present = row_for(&summary, room.students[0].id);
    assert_eq!(present["total_days"], 1);
    assert_eq!(present["present_days"], 1);
    assert_eq!(present["percent"], 100);

    let absent = row_for(&summary, room.students[4].id);
    assert_eq!(absent["total_days"], 1);
    assert_eq!(absent["present_days"], 0);
    assert_eq!(absent["percent"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_remarking_a_day_replaces_it(pool: PgPool) {
    let room = classroom(&pool, 3).await;
    let app = test_app(pool);
    let token = room.staff.token();

    let body = mark_body(&room, DAY, &[true, false, true]);
    for _ in 0..2 {
        let (status, _) =
            send(&app, Method::POST, "/api/attendance", Some(&token), Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let summary = subject_summary(&app, &room).await;
    for student in &room.students {
        assert_eq!(row_for(&summary, student.id)["total_days"], 1);
    }

    // A correction flips the second student without adding a day.
    let (status, ack) = send(
        &app,
        Method::POST,
        "/api/attendance",
        Some(&token),
        Some(mark_body(&room, DAY, &[true, true, true])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["revision"], 3);

    let summary = subject_summary(&app, &room).await;
    let corrected = row_for(&summary, room.students[1].id);
    assert_eq!(corrected["total_days"], 1);
    assert_eq!(corrected["present_days"], 1);

    let uri = format!(
        "/api/attendance/dates?subject_id={}&session_id={}",
        room.subject_id, room.session_id
    );
    let (status, dates) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dates.as_array().unwrap().len(), 1);
    assert_eq!(dates[0]["date"], DAY);
    assert_eq!(dates[0]["present"], 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_daily_log_lists_marks(pool: PgPool) {
    let room = classroom(&pool, 2).await;
    let app = test_app(pool);
    let token = room.staff.token();

    send(
        &app,
        Method::POST,
        "/api/attendance",
        Some(&token),
        Some(mark_body(&room, DAY, &[false, true])),
    )
    .await;

    let uri = format!(
        "/api/attendance/daily?subject_id={}&session_id={}&date={DAY}",
        room.subject_id, room.session_id
    );
    let (status, log) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["entries"].as_array().unwrap().len(), 2);
    assert_eq!(log["entries"][0]["student_id"], room.students[0].id.to_string());
    assert_eq!(log["entries"][0]["present"], false);

    let (status, empty) = send(
        &app,
        Method::GET,
        &uri.replace(DAY, "2024-01-11"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(empty["entries"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_batches_are_rejected(pool: PgPool) {
    let room = classroom(&pool, 2).await;
    let outsider = create_user(&pool, Role::Student, "Not", "Enrolled").await;
    let app = test_app(pool);
    let token = room.staff.token();

    let foreign = json!({
        "subject_id": room.subject_id,
        "session_id": room.session_id,
        "date": DAY,
        "entries": [
            { "student_id": room.students[0].id, "present": true },
            { "student_id": outsider.id, "present": true }
        ]
    });
    let (status, _) = send(&app, Method::POST, "/api/attendance", Some(&token), Some(foreign)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let duplicate = json!({
        "subject_id": room.subject_id,
        "session_id": room.session_id,
        "date": DAY,
        "entries": [
            { "student_id": room.students[0].id, "present": true },
            { "student_id": room.students[0].id, "present": false }
        ]
    });
    let (status, _) =
        send(&app, Method::POST, "/api/attendance", Some(&token), Some(duplicate)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/attendance",
        Some(&token),
        Some(mark_body(&room, "2099-03-01", &[true, true])),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_staff_cannot_mark_another_teachers_subject(pool: PgPool) {
    let room = classroom(&pool, 1).await;
    let other = create_user(&pool, Role::Staff, "Other", "Teacher").await;
    let app = test_app(pool);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/attendance",
        Some(&other.token()),
        Some(mark_body(&room, DAY, &[true])),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    // Administrators may mark any subject.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/attendance",
        Some(&room.admin.token()),
        Some(mark_body(&room, DAY, &[true])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unmarked_student_sees_zero_summary(pool: PgPool) {
    let room = classroom(&pool, 1).await;
    let app = test_app(pool);
    let student = &room.students[0];

    let (status, summary) =
        send(&app, Method::GET, "/api/attendance/summary/me", Some(&student.token()), None).await;
    assert_eq!(status, StatusCode::OK);

    let subjects = summary["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0]["subject_id"], room.subject_id.to_string());
    assert_eq!(subjects[0]["total_days"], 0);
    assert_eq!(subjects[0]["percent"], 0);
    assert_eq!(summary["overall"]["total_days"], 0);
    assert_eq!(summary["overall"]["percent"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_summary_spans_subjects(pool: PgPool) {
    let room = classroom(&pool, 1).await;
    let second = create_subject(&pool, "Databases", room.course_id, room.staff.id).await;
    let app = test_app(pool);
    let token = room.staff.token();
    let student = &room.students[0];

    for (subject, date, present) in [
        (room.subject_id, "2024-01-10", true),
        (room.subject_id, "2024-01-11", false),
        (second, "2024-01-10", true),
    ] {
        let body = json!({
            "subject_id": subject,
            "session_id": room.session_id,
            "date": date,
            "entries": [{ "student_id": student.id, "present": present }]
        });
        let (status, _) = send(&app, Method::POST, "/api/attendance", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let uri = format!("/api/attendance/summary/students/{}", student.id);
    let (status, summary) = send(&app, Method::GET, &uri, Some(&room.admin.token()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["subjects"].as_array().unwrap().len(), 2);
    assert_eq!(summary["overall"]["total_days"], 3);
    assert_eq!(summary["overall"]["present_days"], 2);
    assert_eq!(summary["overall"]["percent"], 67);

    // Students may read their own summary through the same route.
    let (status, _) = send(&app, Method::GET, &uri, Some(&student.token()), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_marks_leave_one_consistent_day(pool: PgPool) {
    let room = classroom(&pool, 4).await;
    let app = test_app(pool.clone());
    let token = room.staff.token();

    let first = mark_body(&room, DAY, &[true, true, true, true]);
    let second = mark_body(&room, DAY, &[false, false, false, false]);

    let ((a, _), (b, _)) = tokio::join!(
        send(&app, Method::POST, "/api/attendance", Some(&token), Some(first)),
        send(&app, Method::POST, "/api/attendance", Some(&token), Some(second)),
    );
    assert_eq!(a, StatusCode::OK);
    assert_eq!(b, StatusCode::OK);

    let days: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance_days WHERE subject_id = $1")
        .bind(room.subject_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(days, 1);

    // Every record comes from the same writer.
    let present: Vec<bool> = sqlx::query_scalar(
        r#"SELECT r.present FROM attendance_records r
           JOIN attendance_days d ON d.id = r.day_id
           WHERE d.subject_id = $1"#,
    )
    .bind(room.subject_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(present.len(), 4);
    assert!(present.iter().all(|p| *p) || present.iter().all(|p| !*p));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_read_another_students_summary(pool: PgPool) {
    let room = classroom(&pool, 2).await;
    let app = test_app(pool);

    let uri = format!("/api/attendance/summary/students/{}", room.students[1].id);
    let (status, body) =
        send(&app, Method::GET, &uri, Some(&room.students[0].token()), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

async fn revision_total(pool: &PgPool, subject_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COALESCE(SUM(revision), 0)::BIGINT FROM attendance_days WHERE subject_id = $1")
        .bind(subject_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleting_a_student_moves_the_summary_revision(pool: PgPool) {
    let room = classroom(&pool, 3).await;
    let app = test_app(pool.clone());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/attendance",
        Some(&room.staff.token()),
        Some(mark_body(&room, DAY, &[true, false, true])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let before = subject_summary(&app, &room).await;
    assert_eq!(before["students"].as_array().unwrap().len(), 3);
    let revision_before = revision_total(&pool, room.subject_id).await;

    let gone = room.students[2].id;
    let uri = format!("/api/users/{gone}");
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&room.admin.token()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(revision_total(&pool, room.subject_id).await > revision_before);

    let after = subject_summary(&app, &room).await;
    let rows = after["students"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["student_id"] != gone.to_string()));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unparseable_query_is_a_json_validation_error(pool: PgPool) {
    let room = classroom(&pool, 1).await;
    let app = test_app(pool);

    let uri = format!(
        "/api/attendance/roster?subject_id=nope&session_id={}",
        room.session_id
    );
    let (status, body) = send(&app, Method::GET, &uri, Some(&room.staff.token()), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert!(body["error"].as_str().unwrap().contains("subject_id"));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/attendance/summary?session_id=missing-subject",
        Some(&room.staff.token()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}
