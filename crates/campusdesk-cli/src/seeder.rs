//! Fake data for development databases.
//!
//! Seeded accounts live under [`SEED_EMAIL_DOMAIN`], which is how
//! [`clear_all`] finds them again. Every seeded account shares the password
//! [`SEED_PASSWORD`].

pub mod attendance;
pub mod catalog;
pub mod models;
pub mod users;

use anyhow::{Result, anyhow};
use sqlx::PgPool;
use std::time::Instant;

use campusdesk_auth::Role;

pub use models::SeedConfig;

pub const SEED_EMAIL_DOMAIN: &str = "seed.campusdesk.test";
pub const SEED_PASSWORD: &str = "password123";

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<()> {
    let started = Instant::now();
    println!("🌱 Seeding database...");

    let password_hash =
        bcrypt::hash(SEED_PASSWORD, 4).map_err(|e| anyhow!("Failed to hash seed password: {e}"))?;

    let session_id = catalog::seed_session(db, config.session_start_year).await?;
    let course_ids = catalog::seed_courses(db, config.courses).await?;

    let staff = users::seed_users(db, Role::Staff, config.staff, &password_hash).await?;
    if staff.is_empty() && config.subjects_per_course > 0 {
        return Err(anyhow!("At least one staff member is needed to teach subjects"));
    }

    let subjects =
        catalog::seed_subjects(db, &course_ids, &staff, config.subjects_per_course).await?;

    let students = users::seed_users(
        db,
        Role::Student,
        config.students_per_course * course_ids.len(),
        &password_hash,
    )
    .await?;
    users::enroll_students(db, &students, &course_ids, session_id).await?;

    if config.attendance_days > 0 {
        attendance::seed_history(db, session_id, config.attendance_days).await?;
    }

    println!("\n✅ Seeding finished in {:?}", started.elapsed());
    println!(
        "   {} courses, {} subjects, {} staff, {} students",
        course_ids.len(),
        subjects.len(),
        staff.len(),
        students.len()
    );
    println!("   Password for every seeded account: {SEED_PASSWORD}");
    Ok(())
}

/// Removes seeded accounts and everything that hangs off them, then any
/// courses and sessions nothing refers to any more.
pub async fn clear_all(db: &PgPool) -> Result<()> {
    let started = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let pattern = format!("%@{SEED_EMAIL_DOMAIN}");
    let mut tx = db.begin().await?;

    let subjects = sqlx::query(
        "DELETE FROM subjects WHERE staff_id IN (SELECT id FROM users WHERE email LIKE $1)",
    )
    .bind(&pattern)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let users = sqlx::query("DELETE FROM users WHERE email LIKE $1")
        .bind(&pattern)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let courses = sqlx::query(
        r#"DELETE FROM courses c
           WHERE NOT EXISTS (SELECT 1 FROM subjects s WHERE s.course_id = c.id)
             AND NOT EXISTS (SELECT 1 FROM student_enrollments e WHERE e.course_id = c.id)"#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let sessions = sqlx::query(
        r#"DELETE FROM academic_sessions s
           WHERE NOT EXISTS (SELECT 1 FROM student_enrollments e WHERE e.session_id = s.id)
             AND NOT EXISTS (SELECT 1 FROM attendance_days d WHERE d.session_id = s.id)"#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    println!(
        "   ✓ Deleted {users} users, {subjects} subjects, {courses} courses, {sessions} sessions in {:?}",
        started.elapsed()
    );
    Ok(())
}
