use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_core::{AppError, pagination::Paginated};

use crate::metrics::track_feedback_submitted;
use crate::middleware::auth::AuthUser;
use crate::modules::caller_reference_error;

use super::model::{CreateFeedbackDto, FeedbackFilterParams, FeedbackMessage, ReplyFeedbackDto};

const FEEDBACK_FIELDS: &str = r#"f.id, f.author_id, u.first_name || ' ' || u.last_name AS author_name,
       f.author_kind, f.message, f.reply, f.replied_by, f.replied_at, f.created_at"#;

pub struct FeedbackService;

impl FeedbackService {
    #[instrument(skip(db, caller, dto), fields(author_id = %caller.id()))]
    pub async fn create(
        db: &PgPool,
        caller: &AuthUser,
        dto: CreateFeedbackDto,
    ) -> Result<FeedbackMessage, AppError> {
        let kind = caller.role().member_kind().ok_or_else(|| {
            AppError::forbidden(format!("Role '{}' cannot send feedback", caller.role()))
        })?;

        let feedback = sqlx::query_as::<_, FeedbackMessage>(&format!(
            r#"WITH f AS (
                   INSERT INTO feedback_messages (author_id, author_kind, message)
                   VALUES ($1, $2, $3)
                   RETURNING *
               )
               SELECT {FEEDBACK_FIELDS} FROM f JOIN users u ON u.id = f.author_id"#
        ))
        .bind(caller.id())
        .bind(kind)
        .bind(dto.message.trim())
        .fetch_one(db)
        .await
        .map_err(|e| caller_reference_error(e, "feedback_messages_author_id_fkey"))?;

        track_feedback_submitted(kind.as_str());
        tracing::info!(feedback_id = %feedback.id, kind = kind.as_str(), "Feedback submitted");

        Ok(feedback)
    }

    #[instrument(skip(db))]
    pub async fn list_for_author(
        db: &PgPool,
        author_id: Uuid,
    ) -> Result<Vec<FeedbackMessage>, AppError> {
        let messages = sqlx::query_as::<_, FeedbackMessage>(&format!(
            r#"SELECT {FEEDBACK_FIELDS}
               FROM feedback_messages f JOIN users u ON u.id = f.author_id
               WHERE f.author_id = $1
               ORDER BY f.created_at DESC, f.id"#
        ))
        .bind(author_id)
        .fetch_all(db)
        .await?;

        Ok(messages)
    }

    #[instrument(skip(db))]
    pub async fn list_all(
        db: &PgPool,
        filters: FeedbackFilterParams,
    ) -> Result<Paginated<FeedbackMessage>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM feedback_messages WHERE ($1::member_kind IS NULL OR author_kind = $1)",
        )
        .bind(filters.kind)
        .fetch_one(db)
        .await?;

        let messages = sqlx::query_as::<_, FeedbackMessage>(&format!(
            r#"SELECT {FEEDBACK_FIELDS}
               FROM feedback_messages f JOIN users u ON u.id = f.author_id
               WHERE ($1::member_kind IS NULL OR f.author_kind = $1)
               ORDER BY f.created_at DESC, f.id
               LIMIT $2 OFFSET $3"#
        ))
        .bind(filters.kind)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated::new(messages, total, &filters.pagination))
    }

    /// A message is answered at most once; the UPDATE only matches unanswered rows.
    #[instrument(skip(db, caller, dto), fields(replied_by = %caller.id()))]
    pub async fn reply(
        db: &PgPool,
        caller: &AuthUser,
        id: Uuid,
        dto: ReplyFeedbackDto,
    ) -> Result<FeedbackMessage, AppError> {
        let replied = sqlx::query_as::<_, FeedbackMessage>(&format!(
            r#"WITH f AS (
                   UPDATE feedback_messages
                   SET reply = $2, replied_by = $3, replied_at = NOW()
                   WHERE id = $1 AND reply IS NULL
                   RETURNING *
               )
               SELECT {FEEDBACK_FIELDS} FROM f JOIN users u ON u.id = f.author_id"#
        ))
        .bind(id)
        .bind(dto.reply.trim())
        .bind(caller.id())
        .fetch_optional(db)
        .await?;

        if let Some(feedback) = replied {
            tracing::info!(feedback_id = %feedback.id, "Feedback answered");
            return Ok(feedback);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM feedback_messages WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(db)
        .await?;

        if exists {
            Err(AppError::conflict(anyhow::anyhow!(
                "Feedback has already been answered"
            )))
        } else {
            Err(AppError::not_found(anyhow::anyhow!("Feedback not found")))
        }
    }
}
