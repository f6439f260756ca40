use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_core::AppError;

use crate::modules::is_foreign_key_violation;

use super::model::{AcademicSession, SessionDto};

const SESSION_COLUMNS: &str = "id, start_year, end_year, created_at, updated_at";

fn session_not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Academic session not found"))
}

pub struct SessionService;

impl SessionService {
    #[instrument(skip(db))]
    pub async fn create_session(db: &PgPool, dto: SessionDto) -> Result<AcademicSession, AppError> {
        let session = sqlx::query_as::<_, AcademicSession>(&format!(
            r#"INSERT INTO academic_sessions (start_year, end_year)
               VALUES ($1, $2)
               RETURNING {SESSION_COLUMNS}"#
        ))
        .bind(dto.start_year)
        .bind(dto.end_year)
        .fetch_one(db)
        .await?;

        tracing::info!(session_id = %session.id, label = %session.label(), "Academic session created");
        Ok(session)
    }

    /// Newest first.
    #[instrument(skip(db))]
    pub async fn get_sessions(db: &PgPool) -> Result<Vec<AcademicSession>, AppError> {
        let sessions = sqlx::query_as::<_, AcademicSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM academic_sessions ORDER BY start_year DESC, end_year DESC, id"
        ))
        .fetch_all(db)
        .await?;

        Ok(sessions)
    }

    #[instrument(skip(db))]
    pub async fn get_session(db: &PgPool, id: Uuid) -> Result<AcademicSession, AppError> {
        sqlx::query_as::<_, AcademicSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM academic_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(session_not_found)
    }

    #[instrument(skip(db))]
    pub async fn update_session(
        db: &PgPool,
        id: Uuid,
        dto: SessionDto,
    ) -> Result<AcademicSession, AppError> {
        sqlx::query_as::<_, AcademicSession>(&format!(
            r#"UPDATE academic_sessions
               SET start_year = $2, end_year = $3, updated_at = NOW()
               WHERE id = $1
               RETURNING {SESSION_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.start_year)
        .bind(dto.end_year)
        .fetch_optional(db)
        .await?
        .ok_or_else(session_not_found)
    }

    /// Attendance recorded for the session goes with it.
    #[instrument(skip(db))]
    pub async fn delete_session(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM academic_sessions WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::conflict(anyhow::anyhow!(
                        "Academic session still has enrolled students"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(session_not_found());
        }

        tracing::info!(session_id = %id, "Academic session deleted");
        Ok(())
    }
}
