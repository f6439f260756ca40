use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_core::{AppError, pagination::Paginated};

use crate::modules::{is_foreign_key_violation, is_unique_violation};

use super::model::{Course, CourseDto, CourseFilterParams};

const COURSE_COLUMNS: &str = "id, name, created_at, updated_at";

fn map_write_error(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        return AppError::conflict(anyhow::anyhow!("A course with this name already exists"));
    }
    AppError::from(e)
}

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db))]
    pub async fn create_course(db: &PgPool, dto: CourseDto) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (name) VALUES ($1) RETURNING {COURSE_COLUMNS}"
        ))
        .bind(dto.name.trim())
        .fetch_one(db)
        .await
        .map_err(map_write_error)?;

        tracing::info!(course_id = %course.id, name = %course.name, "Course created");
        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn get_courses(
        db: &PgPool,
        filters: CourseFilterParams,
    ) -> Result<Paginated<Course>, AppError> {
        let name = filters
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM courses WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&name)
        .fetch_one(db)
        .await?;

        let courses = sqlx::query_as::<_, Course>(&format!(
            r#"SELECT {COURSE_COLUMNS} FROM courses
               WHERE ($1::text IS NULL OR name ILIKE $1)
               ORDER BY name
               LIMIT $2 OFFSET $3"#
        ))
        .bind(&name)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated::new(courses, total, &filters.pagination))
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, id: Uuid) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    #[instrument(skip(db))]
    pub async fn update_course(db: &PgPool, id: Uuid, dto: CourseDto) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            r#"UPDATE courses SET name = $2, updated_at = NOW()
               WHERE id = $1
               RETURNING {COURSE_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.name.trim())
        .fetch_optional(db)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    /// Deletes the course and its subjects. Refused while students are enrolled.
    #[instrument(skip(db))]
    pub async fn delete_course(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::conflict(anyhow::anyhow!(
                        "Course still has enrolled students"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        tracing::info!(course_id = %id, "Course deleted");
        Ok(())
    }
}
