use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_auth::Role;
use campusdesk_cache::{RedisCache, invalidate};
use campusdesk_core::{AppError, pagination::Paginated};

use crate::middleware::auth::AuthUser;
use crate::modules::is_foreign_key_violation;

use super::model::{CreateSubjectDto, Subject, SubjectFilterParams, UpdateSubjectDto};

const SUBJECT_SELECT: &str = r#"SELECT s.id, s.name, s.course_id, c.name AS course_name,
           s.staff_id, u.first_name || ' ' || u.last_name AS staff_name,
           s.created_at, s.updated_at
       FROM subjects s
       JOIN courses c ON c.id = s.course_id
       JOIN users u ON u.id = s.staff_id"#;

fn subject_not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Subject not found"))
}

/// Administrators manage every subject; staff only the ones they teach.
pub fn ensure_subject_owner(caller: &AuthUser, subject: &Subject) -> Result<(), AppError> {
    match caller.role() {
        Role::Administrator => Ok(()),
        Role::Staff if subject.staff_id.into_inner() == caller.id() => Ok(()),
        _ => Err(AppError::forbidden(format!(
            "You do not teach subject {}",
            subject.id
        ))),
    }
}

pub struct SubjectService;

impl SubjectService {
    async fn check_references(
        db: &PgPool,
        course_id: Option<Uuid>,
        staff_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(course_id) = course_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)",
            )
            .bind(course_id)
            .fetch_one(db)
            .await?;

            if !exists {
                return Err(AppError::unprocessable(anyhow::anyhow!(
                    "Course {} does not exist",
                    course_id
                )));
            }
        }

        if let Some(staff_id) = staff_id {
            let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
                .bind(staff_id)
                .fetch_optional(db)
                .await?;

            if role != Some(Role::Staff) {
                return Err(AppError::unprocessable(anyhow::anyhow!(
                    "User {} is not a staff member",
                    staff_id
                )));
            }
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn create_subject(db: &PgPool, dto: CreateSubjectDto) -> Result<Subject, AppError> {
        Self::check_references(
            db,
            Some(dto.course_id.into_inner()),
            Some(dto.staff_id.into_inner()),
        )
        .await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO subjects (name, course_id, staff_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(dto.name.trim())
        .bind(dto.course_id)
        .bind(dto.staff_id)
        .fetch_one(db)
        .await
        .map_err(map_reference_error)?;

        tracing::info!(subject_id = %id, course_id = %dto.course_id, staff_id = %dto.staff_id, "Subject created");
        Self::get_subject(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_subjects(
        db: &PgPool,
        filters: SubjectFilterParams,
    ) -> Result<Paginated<Subject>, AppError> {
        let where_clause = r#"WHERE ($1::uuid IS NULL OR s.course_id = $1)
              AND ($2::uuid IS NULL OR s.staff_id = $2)"#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM subjects s {where_clause}"
        ))
        .bind(filters.course_id)
        .bind(filters.staff_id)
        .fetch_one(db)
        .await?;

        let subjects = sqlx::query_as::<_, Subject>(&format!(
            "{SUBJECT_SELECT} {where_clause} ORDER BY c.name, s.name, s.id LIMIT $3 OFFSET $4"
        ))
        .bind(filters.course_id)
        .bind(filters.staff_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated::new(subjects, total, &filters.pagination))
    }

    #[instrument(skip(db))]
    pub async fn get_staff_subjects(db: &PgPool, staff_id: Uuid) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>(&format!(
            "{SUBJECT_SELECT} WHERE s.staff_id = $1 ORDER BY c.name, s.name, s.id"
        ))
        .bind(staff_id)
        .fetch_all(db)
        .await?;

        Ok(subjects)
    }

    #[instrument(skip(db))]
    pub async fn get_subject(db: &PgPool, id: Uuid) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(&format!("{SUBJECT_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(subject_not_found)
    }

    #[instrument(skip(db))]
    pub async fn update_subject(
        db: &PgPool,
        id: Uuid,
        dto: UpdateSubjectDto,
    ) -> Result<Subject, AppError> {
        Self::check_references(
            db,
            dto.course_id.map(|c| c.into_inner()),
            dto.staff_id.map(|s| s.into_inner()),
        )
        .await?;

        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"UPDATE subjects
               SET name = COALESCE($2, name),
                   course_id = COALESCE($3, course_id),
                   staff_id = COALESCE($4, staff_id),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id"#,
        )
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.course_id)
        .bind(dto.staff_id)
        .fetch_optional(db)
        .await
        .map_err(map_reference_error)?
        .ok_or_else(subject_not_found)?;

        Self::get_subject(db, updated).await
    }

    /// Attendance and results recorded for the subject go with it.
    #[instrument(skip(db, cache))]
    pub async fn delete_subject(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(subject_not_found());
        }

        invalidate::all_attendance_summaries(cache).await;
        tracing::info!(subject_id = %id, "Subject deleted");
        Ok(())
    }
}

// A course or staff member removed between the check and the write.
fn map_reference_error(e: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&e) {
        return AppError::unprocessable(anyhow::anyhow!("Course or staff member does not exist"));
    }
    AppError::from(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusdesk_auth::CallerIdentity;
    use campusdesk_models::{CourseId, SubjectId, UserId};
    use chrono::Utc;

    fn subject(staff_id: Uuid) -> Subject {
        Subject {
            id: SubjectId::new(),
            name: "Compilers".into(),
            course_id: CourseId::new(),
            course_name: "Computer Science".into(),
            staff_id: UserId::from(staff_id),
            staff_name: "Ada Lovelace".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn caller(id: Uuid, role: Role) -> AuthUser {
        AuthUser(CallerIdentity { id, role })
    }

    #[test]
    fn test_owner_and_admin_may_manage() {
        let owner = Uuid::new_v4();
        let s = subject(owner);
        assert!(ensure_subject_owner(&caller(owner, Role::Staff), &s).is_ok());
        assert!(ensure_subject_owner(&caller(Uuid::new_v4(), Role::Administrator), &s).is_ok());
    }

    #[test]
    fn test_other_staff_and_students_are_forbidden() {
        let s = subject(Uuid::new_v4());
        let err = ensure_subject_owner(&caller(Uuid::new_v4(), Role::Staff), &s).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);

        // A student id matching the staff id still is not the teacher.
        let s = subject(Uuid::from_u128(7));
        assert!(ensure_subject_owner(&caller(Uuid::from_u128(7), Role::Student), &s).is_err());
    }
}
