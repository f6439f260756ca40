use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_auth::Role;
use campusdesk_cache::{RedisCache, invalidate};
use campusdesk_core::{AppError, hash_password, pagination::Paginated};

use crate::metrics::track_user_created;
use crate::modules::{is_foreign_key_violation, is_unique_violation};

use super::model::{CreateUserDto, Enrollment, SetEnrollmentDto, User, UserFilterParams, UserProfile};

pub const USER_COLUMNS: &str = "id, first_name, last_name, email, role, created_at, updated_at";

const ENROLLMENT_SELECT: &str = r#"SELECT e.user_id AS student_id, e.course_id, c.name AS course_name,
           e.session_id, s.start_year AS session_start_year, s.end_year AS session_end_year
       FROM student_enrollments e
       JOIN courses c ON c.id = e.course_id
       JOIN academic_sessions s ON s.id = e.session_id"#;

pub struct UserService;

impl UserService {
    #[instrument(skip(db, dto), fields(email = %dto.email, role = %dto.role))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let hashed_password = hash_password(&dto.password)?;
        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (first_name, last_name, email, password, role)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(dto.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::conflict(anyhow::anyhow!("Email already exists"));
            }
            AppError::from(e)
        })?;

        if let (Some(course_id), Some(session_id)) = (dto.course_id, dto.session_id) {
            sqlx::query(
                "INSERT INTO student_enrollments (user_id, course_id, session_id) VALUES ($1, $2, $3)",
            )
            .bind(user.id)
            .bind(course_id)
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(map_enrollment_error)?;
        }

        tx.commit().await?;

        track_user_created(user.role.as_str());
        tracing::info!(user_id = %user.id, role = %user.role, "User created");

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<Paginated<User>, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let search = filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let where_clause = r#"WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::text IS NULL
                   OR first_name ILIKE $2 OR last_name ILIKE $2 OR email ILIKE $2)"#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM users {where_clause}"
        ))
        .bind(filters.role)
        .bind(&search)
        .fetch_one(db)
        .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users {where_clause}
               ORDER BY last_name, first_name, id
               LIMIT $3 OFFSET $4"#
        ))
        .bind(filters.role)
        .bind(&search)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(Paginated::new(users, total, &filters.pagination))
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    /// Loads the user and fails with 422 unless they hold `role`.
    pub async fn require_role(db: &PgPool, id: Uuid, role: Role) -> Result<User, AppError> {
        let user = Self::get_user(db, id).await?;
        if user.role != role {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "User {} is not a {}",
                id,
                role
            )));
        }
        Ok(user)
    }

    /// Hard delete. Attendance, leave, feedback and results owned by the user go with it.
    #[instrument(skip(db, cache))]
    pub async fn delete_user(
        db: &PgPool,
        cache: Option<&RedisCache>,
        caller_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError> {
        if caller_id == id {
            return Err(AppError::conflict(anyhow::anyhow!(
                "You cannot delete your own account"
            )));
        }

        let mut tx = db.begin().await?;

        // Removing the user's records changes every summary they appear in.
        let touched_days = sqlx::query(
            r#"UPDATE attendance_days
               SET revision = revision + 1, updated_at = clock_timestamp()
               WHERE id IN (SELECT day_id FROM attendance_records WHERE student_id = $1)"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::conflict(anyhow::anyhow!(
                        "User still teaches subjects; reassign them first"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        }

        tx.commit().await?;

        invalidate::all_attendance_summaries(cache).await;
        tracing::info!(user_id = %id, deleted_by = %caller_id, touched_days, "User deleted");

        Ok(())
    }

    pub async fn get_enrollment(db: &PgPool, student_id: Uuid) -> Result<Option<Enrollment>, AppError> {
        let enrollment =
            sqlx::query_as::<_, Enrollment>(&format!("{ENROLLMENT_SELECT} WHERE e.user_id = $1"))
                .bind(student_id)
                .fetch_optional(db)
                .await?;
        Ok(enrollment)
    }

    #[instrument(skip(db))]
    pub async fn set_enrollment(
        db: &PgPool,
        student_id: Uuid,
        dto: SetEnrollmentDto,
    ) -> Result<Enrollment, AppError> {
        Self::require_role(db, student_id, Role::Student).await?;

        sqlx::query(
            r#"INSERT INTO student_enrollments (user_id, course_id, session_id)
               VALUES ($1, $2, $3)
               ON CONFLICT (user_id) DO UPDATE
               SET course_id = EXCLUDED.course_id,
                   session_id = EXCLUDED.session_id,
                   updated_at = NOW()"#,
        )
        .bind(student_id)
        .bind(dto.course_id)
        .bind(dto.session_id)
        .execute(db)
        .await
        .map_err(map_enrollment_error)?;

        Self::get_enrollment(db, student_id)
            .await?
            .ok_or_else(|| AppError::internal_error("Enrollment vanished after write"))
    }

    #[instrument(skip(db))]
    pub async fn get_profile(db: &PgPool, id: Uuid) -> Result<UserProfile, AppError> {
        let user = Self::get_user(db, id).await?;
        let enrollment = if user.role == Role::Student {
            Self::get_enrollment(db, id).await?
        } else {
            None
        };

        Ok(UserProfile {
            landing: user.role.landing().to_string(),
            user,
            enrollment,
        })
    }
}

fn map_enrollment_error(e: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&e) {
        return AppError::unprocessable(anyhow::anyhow!("Course or session does not exist"));
    }
    AppError::from(e)
}
