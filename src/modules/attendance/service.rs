//! Marking, per-day logs and read-time summaries.
//!
//! A mark replaces the stored day wholesale inside one transaction. The
//! day-header upsert takes the row lock that serializes concurrent marks of
//! the same (subject, session, date).

use std::collections::HashSet;

use chrono::Local;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_auth::Role;
use campusdesk_cache::{RedisCache, invalidate, keys};
use campusdesk_config::AttendancePolicy;
use campusdesk_core::AppError;
use campusdesk_models::{AttendanceDayId, UserId};

use crate::metrics::{track_attendance_marked, track_summary_cache};
use crate::middleware::auth::AuthUser;
use crate::modules::caller_reference_error;
use crate::modules::sessions::model::AcademicSession;
use crate::modules::sessions::service::SessionService;
use crate::modules::subjects::model::Subject;
use crate::modules::subjects::service::{SubjectService, ensure_subject_owner};

use super::model::{
    CurrentSubject, DailyLog, DailyLogEntry, DailyLogQuery, MarkAttendanceAck, MarkAttendanceDto,
    MarkedDate, RosterStudent, StudentCount, StudentSummary, SubjectCount, SubjectSessionQuery,
    SubjectSummary, merge_student_summary, merge_subject_summary, validate_batch,
};

const ROSTER_QUERY: &str = r#"SELECT u.id, u.first_name, u.last_name, u.email
       FROM student_enrollments e
       JOIN users u ON u.id = e.user_id
       WHERE e.course_id = $1 AND e.session_id = $2
       ORDER BY u.last_name, u.first_name, u.id"#;

pub struct AttendanceService;

impl AttendanceService {
    /// Subject and session must both exist; the caller must be allowed to manage the subject.
    async fn load_pair(
        db: &PgPool,
        caller: Option<&AuthUser>,
        subject_id: Uuid,
        session_id: Uuid,
    ) -> Result<(Subject, AcademicSession), AppError> {
        let subject = SubjectService::get_subject(db, subject_id).await?;
        if let Some(caller) = caller {
            ensure_subject_owner(caller, &subject)?;
        }
        let session = SessionService::get_session(db, session_id).await?;
        Ok((subject, session))
    }

    #[instrument(skip(db, cache, policy, dto), fields(
        subject_id = %dto.subject_id,
        session_id = %dto.session_id,
        date = %dto.date,
        entries = dto.entries.len()
    ))]
    pub async fn mark_attendance(
        db: &PgPool,
        cache: Option<&RedisCache>,
        policy: &AttendancePolicy,
        caller: &AuthUser,
        dto: MarkAttendanceDto,
    ) -> Result<MarkAttendanceAck, AppError> {
        let (subject, session) = Self::load_pair(
            db,
            Some(caller),
            dto.subject_id.into_inner(),
            dto.session_id.into_inner(),
        )
        .await?;

        policy
            .check(
                dto.date,
                Local::now().date_naive(),
                session.start_year,
                session.end_year,
            )
            .map_err(|reason| AppError::unprocessable(anyhow::anyhow!(reason)))?;

        let mut tx = db.begin().await?;

        let roster: HashSet<UserId> = sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM student_enrollments WHERE course_id = $1 AND session_id = $2",
        )
        .bind(subject.course_id)
        .bind(session.id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        validate_batch(&dto.entries, &roster).map_err(AppError::unprocessable)?;

        let (day_id, revision) = sqlx::query_as::<_, (AttendanceDayId, i64)>(
            r#"INSERT INTO attendance_days (subject_id, session_id, attendance_date, taken_by)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (subject_id, session_id, attendance_date) DO UPDATE
               SET revision = attendance_days.revision + 1,
                   taken_by = EXCLUDED.taken_by,
                   updated_at = clock_timestamp()
               RETURNING id, revision"#,
        )
        .bind(subject.id)
        .bind(session.id)
        .bind(dto.date)
        .bind(caller.id())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| caller_reference_error(e, "attendance_days_taken_by_fkey"))?;

        let (students, marks): (Vec<Uuid>, Vec<bool>) = dto
            .entries
            .iter()
            .map(|e| (e.student_id.into_inner(), e.present))
            .unzip();

        sqlx::query(
            r#"INSERT INTO attendance_records (day_id, student_id, present)
               SELECT $1, student_id, present
               FROM UNNEST($2::uuid[], $3::bool[]) AS batch(student_id, present)
               ON CONFLICT (day_id, student_id) DO UPDATE
               SET present = EXCLUDED.present, updated_at = NOW()"#,
        )
        .bind(day_id)
        .bind(&students)
        .bind(&marks)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM attendance_records WHERE day_id = $1 AND student_id <> ALL($2)")
            .bind(day_id)
            .bind(&students)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        invalidate::attendance_summary(cache, subject.id.into_inner(), session.id.into_inner())
            .await;
        track_attendance_marked(dto.entries.len());

        let present = marks.iter().filter(|&&p| p).count();
        tracing::info!(
            day_id = %day_id,
            marked_by = %caller.id(),
            present,
            absent = marks.len() - present,
            revision,
            "Attendance marked"
        );

        Ok(MarkAttendanceAck {
            day_id,
            subject_id: subject.id,
            session_id: session.id,
            date: dto.date,
            present,
            absent: marks.len() - present,
            revision,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_roster(
        db: &PgPool,
        query: SubjectSessionQuery,
    ) -> Result<Vec<RosterStudent>, AppError> {
        let (subject, session) = Self::load_pair(
            db,
            None,
            query.subject_id.into_inner(),
            query.session_id.into_inner(),
        )
        .await?;

        let roster = sqlx::query_as::<_, RosterStudent>(ROSTER_QUERY)
            .bind(subject.course_id)
            .bind(session.id)
            .fetch_all(db)
            .await?;

        Ok(roster)
    }

    #[instrument(skip(db, caller))]
    pub async fn get_daily_log(
        db: &PgPool,
        caller: &AuthUser,
        query: DailyLogQuery,
    ) -> Result<DailyLog, AppError> {
        let (subject, session) = Self::load_pair(
            db,
            Some(caller),
            query.subject_id.into_inner(),
            query.session_id.into_inner(),
        )
        .await?;

        let entries = sqlx::query_as::<_, DailyLogEntry>(
            r#"SELECT r.student_id, u.first_name, u.last_name, r.present
               FROM attendance_days d
               JOIN attendance_records r ON r.day_id = d.id
               JOIN users u ON u.id = r.student_id
               WHERE d.subject_id = $1 AND d.session_id = $2 AND d.attendance_date = $3
               ORDER BY u.last_name, u.first_name, u.id"#,
        )
        .bind(subject.id)
        .bind(session.id)
        .bind(query.date)
        .fetch_all(db)
        .await?;

        Ok(DailyLog {
            subject_id: subject.id,
            session_id: session.id,
            date: query.date,
            entries,
        })
    }

    /// Days with attendance for the pair, newest first.
    #[instrument(skip(db, caller))]
    pub async fn get_marked_dates(
        db: &PgPool,
        caller: &AuthUser,
        query: SubjectSessionQuery,
    ) -> Result<Vec<MarkedDate>, AppError> {
        let (subject, session) = Self::load_pair(
            db,
            Some(caller),
            query.subject_id.into_inner(),
            query.session_id.into_inner(),
        )
        .await?;

        let dates = sqlx::query_as::<_, MarkedDate>(
            r#"SELECT d.attendance_date AS date,
                      COUNT(r.id) FILTER (WHERE r.present) AS present,
                      COUNT(r.id) FILTER (WHERE NOT r.present) AS absent,
                      d.taken_by,
                      d.updated_at
               FROM attendance_days d
               LEFT JOIN attendance_records r ON r.day_id = d.id
               WHERE d.subject_id = $1 AND d.session_id = $2
               GROUP BY d.id
               ORDER BY d.attendance_date DESC"#,
        )
        .bind(subject.id)
        .bind(session.id)
        .fetch_all(db)
        .await?;

        Ok(dates)
    }

    async fn summary_revision(
        db: &PgPool,
        subject_id: Uuid,
        session_id: Uuid,
    ) -> Result<i64, AppError> {
        // Grows on every committed mark of the pair and whenever a user
        // deletion drops records from one of its days.
        let revision = sqlx::query_scalar::<_, i64>(
            r#"SELECT (COALESCE(SUM(revision), 0) + COUNT(*))::BIGINT
               FROM attendance_days
               WHERE subject_id = $1 AND session_id = $2"#,
        )
        .bind(subject_id)
        .bind(session_id)
        .fetch_one(db)
        .await?;

        Ok(revision)
    }

    async fn subject_counts(
        db: &PgPool,
        subject_id: Uuid,
        session_id: Uuid,
    ) -> Result<Vec<StudentCount>, AppError> {
        let counts = sqlx::query_as::<_, StudentCount>(
            r#"SELECT r.student_id, u.first_name, u.last_name,
                      COUNT(*) AS total,
                      COUNT(*) FILTER (WHERE r.present) AS present
               FROM attendance_records r
               JOIN attendance_days d ON d.id = r.day_id
               JOIN users u ON u.id = r.student_id
               WHERE d.subject_id = $1 AND d.session_id = $2
               GROUP BY r.student_id, u.first_name, u.last_name"#,
        )
        .bind(subject_id)
        .bind(session_id)
        .fetch_all(db)
        .await?;

        Ok(counts)
    }

    async fn cached_subject_counts(
        db: &PgPool,
        cache: Option<&RedisCache>,
        subject_id: Uuid,
        session_id: Uuid,
    ) -> Result<Vec<StudentCount>, AppError> {
        let Some(cache) = cache else {
            return Self::subject_counts(db, subject_id, session_id).await;
        };

        let revision = Self::summary_revision(db, subject_id, session_id).await?;
        let key = keys::attendance::summary(subject_id, session_id, revision);

        if let Some(counts) = cache.get::<Vec<StudentCount>>(&key).await {
            track_summary_cache(true);
            return Ok(counts);
        }
        track_summary_cache(false);

        let counts = Self::subject_counts(db, subject_id, session_id).await?;
        if let Err(e) = cache.set(&key, &counts).await {
            tracing::warn!(error = %e, cache.key = %key, "Failed to cache attendance summary");
        }

        Ok(counts)
    }

    #[instrument(skip(db, cache, caller))]
    pub async fn get_subject_summary(
        db: &PgPool,
        cache: Option<&RedisCache>,
        caller: &AuthUser,
        query: SubjectSessionQuery,
    ) -> Result<SubjectSummary, AppError> {
        let (subject, session) = Self::load_pair(
            db,
            Some(caller),
            query.subject_id.into_inner(),
            query.session_id.into_inner(),
        )
        .await?;

        let counts =
            Self::cached_subject_counts(db, cache, subject.id.into_inner(), session.id.into_inner())
                .await?;

        let roster = sqlx::query_as::<_, RosterStudent>(ROSTER_QUERY)
            .bind(subject.course_id)
            .bind(session.id)
            .fetch_all(db)
            .await?;

        Ok(SubjectSummary {
            subject_id: subject.id,
            session_id: session.id,
            students: merge_subject_summary(roster, counts),
        })
    }

    /// Per-subject tallies for one student, including zero rows for the
    /// subjects of their current enrollment.
    #[instrument(skip(db))]
    pub async fn get_student_summary(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<StudentSummary, AppError> {
        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
            .bind(student_id)
            .fetch_optional(db)
            .await?;

        if role != Some(Role::Student) {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        let counts = sqlx::query_as::<_, SubjectCount>(
            r#"SELECT d.subject_id, s.name AS subject_name, d.session_id,
                      COUNT(*) AS total,
                      COUNT(*) FILTER (WHERE r.present) AS present
               FROM attendance_records r
               JOIN attendance_days d ON d.id = r.day_id
               JOIN subjects s ON s.id = d.subject_id
               WHERE r.student_id = $1
               GROUP BY d.subject_id, s.name, d.session_id"#,
        )
        .bind(student_id)
        .fetch_all(db)
        .await?;

        let current = sqlx::query_as::<_, CurrentSubject>(
            r#"SELECT s.id AS subject_id, s.name AS subject_name, e.session_id
               FROM student_enrollments e
               JOIN subjects s ON s.course_id = e.course_id
               WHERE e.user_id = $1"#,
        )
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(merge_student_summary(
            UserId::from(student_id),
            counts,
            current,
        ))
    }
}
