//! Staff and student accounts.
//!
//! Generated emails carry the role tag as the last dot segment of the local
//! part, the same shape self-registration expects.

use anyhow::Result;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;
use uuid::Uuid;

use campusdesk_auth::Role;

use super::SEED_EMAIL_DOMAIN;
use super::models::UserSeed;

fn email_tag(role: Role) -> &'static str {
    match role {
        Role::Administrator => "admin",
        Role::Staff => "staff",
        Role::Student => "student",
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

pub fn generate_users(role: Role, count: usize, password_hash: &str) -> Vec<UserSeed> {
    // Run-unique so repeated seeding never collides on email.
    let run = Uuid::new_v4().simple().to_string();
    let run = &run[..6];

    (0..count)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let email = format!(
                "{}.{}{}{}.{}@{}",
                slug(&first_name),
                slug(&last_name),
                run,
                idx,
                email_tag(role),
                SEED_EMAIL_DOMAIN
            );

            UserSeed {
                first_name,
                last_name,
                email,
                password_hash: password_hash.to_string(),
                role,
            }
        })
        .collect()
}

pub async fn seed_users(
    db: &PgPool,
    role: Role,
    count: usize,
    password_hash: &str,
) -> Result<Vec<Uuid>> {
    let started = Instant::now();
    let icon = if role == Role::Student { "🎓" } else { "👥" };
    println!("{icon} Seeding {count} {role} users...");

    let users = generate_users(role, count, password_hash);
    let ids = insert_users_batch(db, &users).await?;

    println!("   ✓ Inserted {} users in {:?}", ids.len(), started.elapsed());
    Ok(ids)
}

pub async fn insert_users_batch(db: &PgPool, users: &[UserSeed]) -> Result<Vec<Uuid>> {
    let mut tx = db.begin().await?;

    // 5 params per user
    const BATCH_SIZE: usize = 1000;

    let mut ids = Vec::with_capacity(users.len());
    for chunk in users.chunks(BATCH_SIZE) {
        ids.extend(insert_users_chunk(&mut tx, chunk).await?);
    }

    tx.commit().await?;
    Ok(ids)
}

async fn insert_users_chunk(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserSeed],
) -> Result<Vec<Uuid>> {
    if users.is_empty() {
        return Ok(Vec::new());
    }

    let mut query =
        String::from("INSERT INTO users (first_name, last_name, email, password, role) VALUES ");
    for i in 0..users.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 5;
        query.push_str(&format!(
            "(${}, ${}, ${}, ${}, ${})",
            p + 1,
            p + 2,
            p + 3,
            p + 4,
            p + 5
        ));
    }
    query.push_str(" RETURNING id");

    let mut q = sqlx::query_scalar::<_, Uuid>(&query);
    for user in users {
        q = q
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role);
    }
    Ok(q.fetch_all(&mut **tx).await?)
}

/// Deals students out evenly across courses, all in one session.
pub async fn enroll_students(
    db: &PgPool,
    student_ids: &[Uuid],
    course_ids: &[Uuid],
    session_id: Uuid,
) -> Result<()> {
    if student_ids.is_empty() || course_ids.is_empty() {
        return Ok(());
    }

    let started = Instant::now();
    println!("📝 Enrolling {} students...", student_ids.len());

    let pairs: Vec<(Uuid, Uuid)> = student_ids
        .iter()
        .enumerate()
        .map(|(i, &student)| (student, course_ids[i % course_ids.len()]))
        .collect();

    let mut tx = db.begin().await?;
    for chunk in pairs.chunks(5000) {
        let mut query =
            String::from("INSERT INTO student_enrollments (user_id, course_id, session_id) VALUES ");
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let p = i * 2;
            query.push_str(&format!("(${}, ${}, ${})", p + 1, p + 2, chunk.len() * 2 + 1));
        }

        let mut q = sqlx::query(&query);
        for (student, course) in chunk {
            q = q.bind(student).bind(course);
        }
        q.bind(session_id).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!("   ✓ Enrolled students in {:?}", started.elapsed());
    Ok(())
}
