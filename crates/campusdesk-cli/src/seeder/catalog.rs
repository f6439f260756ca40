//! Courses, sessions and subjects.

use anyhow::Result;
use fake::Fake;
use fake::faker::company::en::Industry;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;
use uuid::Uuid;

use super::models::SubjectSeed;

const SUBJECT_TOPICS: &[&str] = &[
    "Foundations",
    "Methods",
    "Statistics",
    "Ethics",
    "Research Project",
    "Applied Practice",
    "Seminar",
    "Laboratory",
];

pub async fn seed_session(db: &PgPool, start_year: i32) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO academic_sessions (start_year, end_year) VALUES ($1, $2) RETURNING id",
    )
    .bind(start_year)
    .bind(start_year + 1)
    .fetch_one(db)
    .await?;

    println!("📅 Created session {}-{}", start_year, start_year + 1);
    Ok(id)
}

pub fn generate_course_names(count: usize) -> Vec<String> {
    (0..count)
        .into_par_iter()
        .map(|_| {
            let industry: String = Industry().fake();
            // Course names are unique; the suffix keeps repeated runs apart.
            let suffix = &Uuid::new_v4().simple().to_string()[..6];
            format!("{industry} {suffix}")
        })
        .collect()
}

pub async fn seed_courses(db: &PgPool, count: usize) -> Result<Vec<Uuid>> {
    let started = Instant::now();
    println!("🏫 Seeding {count} courses...");

    let names = generate_course_names(count);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(names.len());
    for chunk in names.chunks(5000) {
        ids.extend(insert_courses_chunk(&mut tx, chunk).await?);
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} courses in {:?}", ids.len(), started.elapsed());
    Ok(ids)
}

async fn insert_courses_chunk(
    tx: &mut Transaction<'_, Postgres>,
    names: &[String],
) -> Result<Vec<Uuid>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("(${i})")).collect();
    let query = format!(
        "INSERT INTO courses (name) VALUES {} RETURNING id",
        placeholders.join(", ")
    );

    let mut q = sqlx::query_scalar::<_, Uuid>(&query);
    for name in names {
        q = q.bind(name);
    }
    Ok(q.fetch_all(&mut **tx).await?)
}

/// Spreads subjects over the staff round-robin.
pub fn generate_subjects(
    course_ids: &[Uuid],
    staff_ids: &[Uuid],
    per_course: usize,
) -> Vec<SubjectSeed> {
    if staff_ids.is_empty() {
        return Vec::new();
    }

    course_ids
        .par_iter()
        .enumerate()
        .flat_map(|(course_idx, &course_id)| {
            (0..per_course)
                .map(|subject_idx| {
                    let topic = SUBJECT_TOPICS[subject_idx % SUBJECT_TOPICS.len()];
                    let level = subject_idx / SUBJECT_TOPICS.len() + 1;
                    SubjectSeed {
                        name: format!("{topic} {level}"),
                        course_id,
                        staff_id: staff_ids[(course_idx * per_course + subject_idx) % staff_ids.len()],
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_subjects(
    db: &PgPool,
    course_ids: &[Uuid],
    staff_ids: &[Uuid],
    per_course: usize,
) -> Result<Vec<Uuid>> {
    let started = Instant::now();
    let subjects = generate_subjects(course_ids, staff_ids, per_course);
    println!("📚 Seeding {} subjects...", subjects.len());

    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(subjects.len());
    // 3 params per subject
    for chunk in subjects.chunks(5000) {
        ids.extend(insert_subjects_chunk(&mut tx, chunk).await?);
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} subjects in {:?}", ids.len(), started.elapsed());
    Ok(ids)
}

async fn insert_subjects_chunk(
    tx: &mut Transaction<'_, Postgres>,
    subjects: &[SubjectSeed],
) -> Result<Vec<Uuid>> {
    if subjects.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = String::from("INSERT INTO subjects (name, course_id, staff_id) VALUES ");
    for i in 0..subjects.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 3;
        query.push_str(&format!("(${}, ${}, ${})", p + 1, p + 2, p + 3));
    }
    query.push_str(" RETURNING id");

    let mut q = sqlx::query_scalar::<_, Uuid>(&query);
    for subject in subjects {
        q = q
            .bind(&subject.name)
            .bind(subject.course_id)
            .bind(subject.staff_id);
    }
    Ok(q.fetch_all(&mut **tx).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_names_are_distinct() {
        let names = generate_course_names(50);
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn test_subjects_round_robin_staff() {
        let courses = vec![Uuid::new_v4(), Uuid::new_v4()];
        let staff = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let subjects = generate_subjects(&courses, &staff, 3);

        assert_eq!(subjects.len(), 6);
        for s in &subjects {
            assert!(staff.contains(&s.staff_id));
            assert!(courses.contains(&s.course_id));
        }
        let taught_by_first = subjects.iter().filter(|s| s.staff_id == staff[0]).count();
        assert_eq!(taught_by_first, 2);
    }

    #[test]
    fn test_no_staff_no_subjects() {
        assert!(generate_subjects(&[Uuid::new_v4()], &[], 4).is_empty());
    }
}
