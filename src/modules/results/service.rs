use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_auth::Role;
use campusdesk_core::AppError;
use campusdesk_models::CourseId;

use crate::middleware::auth::AuthUser;
use crate::modules::subjects::service::{SubjectService, ensure_subject_owner};

use super::model::{ExamResult, ExamResultRow, ResultFilterParams, UpsertResultDto};

const RESULT_FIELDS: &str = r#"r.id, r.student_id, u.first_name || ' ' || u.last_name AS student_name,
       r.subject_id, s.name AS subject_name, r.marks, r.updated_at"#;

pub struct ResultService;

impl ResultService {
    /// Writes or overwrites the mark for (student, subject).
    #[instrument(skip(db, caller), fields(recorded_by = %caller.id()))]
    pub async fn upsert(
        db: &PgPool,
        caller: &AuthUser,
        dto: UpsertResultDto,
    ) -> Result<ExamResult, AppError> {
        let subject = SubjectService::get_subject(db, dto.subject_id.into_inner()).await?;
        ensure_subject_owner(caller, &subject)?;

        let student = sqlx::query_as::<_, (Role, Option<CourseId>)>(
            r#"SELECT u.role, e.course_id
               FROM users u
               LEFT JOIN student_enrollments e ON e.user_id = u.id
               WHERE u.id = $1"#,
        )
        .bind(dto.student_id)
        .fetch_optional(db)
        .await?;

        match student {
            None => {
                return Err(AppError::unprocessable(anyhow::anyhow!(
                    "Student {} does not exist",
                    dto.student_id
                )));
            }
            Some((role, _)) if role != Role::Student => {
                return Err(AppError::unprocessable(anyhow::anyhow!(
                    "User {} is not a student",
                    dto.student_id
                )));
            }
            Some((_, course)) if course != Some(subject.course_id) => {
                return Err(AppError::unprocessable(anyhow::anyhow!(
                    "Student {} is not enrolled in {}",
                    dto.student_id,
                    subject.course_name
                )));
            }
            Some(_) => {}
        }

        let row = sqlx::query_as::<_, ExamResultRow>(&format!(
            r#"WITH r AS (
                   INSERT INTO exam_results (student_id, subject_id, marks, recorded_by)
                   VALUES ($1, $2, $3, $4)
                   ON CONFLICT (student_id, subject_id) DO UPDATE
                   SET marks = EXCLUDED.marks,
                       recorded_by = EXCLUDED.recorded_by,
                       updated_at = NOW()
                   RETURNING *
               )
               SELECT {RESULT_FIELDS}
               FROM r
               JOIN users u ON u.id = r.student_id
               JOIN subjects s ON s.id = r.subject_id"#
        ))
        .bind(dto.student_id)
        .bind(dto.subject_id)
        .bind(dto.marks)
        .bind(caller.id())
        .fetch_one(db)
        .await?;

        tracing::info!(result_id = %row.id, marks = row.marks, "Exam result recorded");
        Ok(ExamResult::from(row))
    }

    /// Lists results visible to the caller: students see their own, staff a
    /// subject they teach, administrators anything matching the filters.
    #[instrument(skip(db, caller), fields(role = %caller.role()))]
    pub async fn list(
        db: &PgPool,
        caller: &AuthUser,
        filters: ResultFilterParams,
    ) -> Result<Vec<ExamResult>, AppError> {
        let (subject_id, student_id) = match caller.role() {
            Role::Student => {
                if filters.student_id.is_some_and(|id| id != caller.id()) {
                    return Err(AppError::forbidden("You may only access your own records"));
                }
                (filters.subject_id, Some(caller.id()))
            }
            Role::Staff => {
                let subject_id = filters.subject_id.ok_or_else(|| {
                    AppError::unprocessable(anyhow::anyhow!("subject_id is required"))
                })?;
                let subject = SubjectService::get_subject(db, subject_id).await?;
                ensure_subject_owner(caller, &subject)?;
                (Some(subject_id), filters.student_id)
            }
            Role::Administrator => (filters.subject_id, filters.student_id),
        };

        Self::query(db, subject_id, student_id).await
    }

    async fn query(
        db: &PgPool,
        subject_id: Option<Uuid>,
        student_id: Option<Uuid>,
    ) -> Result<Vec<ExamResult>, AppError> {
        let rows = sqlx::query_as::<_, ExamResultRow>(&format!(
            r#"SELECT {RESULT_FIELDS}
               FROM exam_results r
               JOIN users u ON u.id = r.student_id
               JOIN subjects s ON s.id = r.subject_id
               WHERE ($1::uuid IS NULL OR r.subject_id = $1)
                 AND ($2::uuid IS NULL OR r.student_id = $2)
               ORDER BY s.name, u.last_name, u.first_name, r.id"#
        ))
        .bind(subject_id)
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(rows.into_iter().map(ExamResult::from).collect())
    }

    #[instrument(skip(db))]
    pub async fn list_for_student(db: &PgPool, student_id: Uuid) -> Result<Vec<ExamResult>, AppError> {
        Self::query(db, None, Some(student_id)).await
    }
}
