//! Attendance history for the seeded session.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use fake::Fake;
use fake::faker::boolean::en::Boolean;
use rayon::prelude::*;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

/// Roughly how often a seeded student turns up, in percent.
const PRESENCE_RATIO: u8 = 85;

pub struct DaySeed {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub taken_by: Uuid,
    pub date: NaiveDate,
    pub records: Vec<(Uuid, bool)>,
}

/// The `count` most recent weekdays strictly before `today`, newest first.
pub fn past_weekdays(today: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut day = today;
    while dates.len() < count {
        day -= Duration::days(1);
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
    }
    dates
}

pub fn generate_days(
    subjects: &[(Uuid, Uuid, Uuid)],
    rosters: &HashMap<Uuid, Vec<Uuid>>,
    dates: &[NaiveDate],
) -> Vec<DaySeed> {
    subjects
        .par_iter()
        .flat_map(|&(subject_id, course_id, staff_id)| {
            let roster = rosters.get(&course_id).cloned().unwrap_or_default();
            if roster.is_empty() {
                return Vec::new();
            }
            dates
                .iter()
                .map(|&date| DaySeed {
                    id: Uuid::new_v4(),
                    subject_id,
                    taken_by: staff_id,
                    date,
                    records: roster
                        .iter()
                        .map(|&student| (student, Boolean(PRESENCE_RATIO).fake()))
                        .collect(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_history(db: &PgPool, session_id: Uuid, days: usize) -> Result<()> {
    let started = Instant::now();

    let subjects: Vec<(Uuid, Uuid, Uuid)> = sqlx::query_as(
        r#"SELECT DISTINCT s.id, s.course_id, s.staff_id
           FROM subjects s
           JOIN student_enrollments e ON e.course_id = s.course_id
           WHERE e.session_id = $1"#,
    )
    .bind(session_id)
    .fetch_all(db)
    .await?;

    let enrollments: Vec<(Uuid, Uuid)> = sqlx::query_as(
        "SELECT course_id, user_id FROM student_enrollments WHERE session_id = $1",
    )
    .bind(session_id)
    .fetch_all(db)
    .await?;

    let mut rosters: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (course_id, student_id) in enrollments {
        rosters.entry(course_id).or_default().push(student_id);
    }

    let dates = past_weekdays(Utc::now().date_naive(), days);
    let day_seeds = generate_days(&subjects, &rosters, &dates);
    println!(
        "🗓️  Seeding {} attendance days across {} subjects...",
        day_seeds.len(),
        subjects.len()
    );

    let mut tx = db.begin().await?;

    // 4 params per day, the session is shared
    for chunk in day_seeds.chunks(5000) {
        let mut query = String::from(
            "INSERT INTO attendance_days (id, subject_id, session_id, attendance_date, taken_by) VALUES ",
        );
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let p = i * 4;
            query.push_str(&format!(
                "(${}, ${}, ${}, ${}, ${})",
                p + 1,
                p + 2,
                chunk.len() * 4 + 1,
                p + 3,
                p + 4
            ));
        }

        let mut q = sqlx::query(&query);
        for day in chunk {
            q = q
                .bind(day.id)
                .bind(day.subject_id)
                .bind(day.date)
                .bind(day.taken_by);
        }
        q.bind(session_id).execute(&mut *tx).await?;
    }

    let records: Vec<(Uuid, Uuid, bool)> = day_seeds
        .iter()
        .flat_map(|day| {
            day.records
                .iter()
                .map(move |&(student, present)| (day.id, student, present))
        })
        .collect();

    // 3 params per record
    for chunk in records.chunks(10000) {
        let mut query = String::from(
            "INSERT INTO attendance_records (day_id, student_id, present) VALUES ",
        );
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let p = i * 3;
            query.push_str(&format!("(${}, ${}, ${})", p + 1, p + 2, p + 3));
        }

        let mut q = sqlx::query(&query);
        for (day_id, student_id, present) in chunk {
            q = q.bind(day_id).bind(student_id).bind(present);
        }
        q.execute(&mut *tx).await?;
    }

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} attendance records in {:?}",
        records.len(),
        started.elapsed()
    );
    Ok(())
}
