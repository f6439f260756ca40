use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_core::{AppError, pagination::Paginated};

use crate::metrics::{track_leave_decided, track_leave_submitted};
use crate::middleware::auth::AuthUser;
use crate::modules::caller_reference_error;

use super::model::{
    DecideLeaveDto, LeaveFilterParams, LeaveQueueParams, LeaveRequest, LeaveStatus, SubmitLeaveDto,
};

const LEAVE_FIELDS: &str = r#"l.id, l.applicant_id, u.first_name || ' ' || u.last_name AS applicant_name,
       l.kind, l.leave_date, l.reason, l.status, l.decided_by, l.decided_at, l.created_at"#;

pub struct LeaveService;

impl LeaveService {
    #[instrument(skip(db, caller, dto), fields(applicant_id = %caller.id(), leave_date = %dto.leave_date))]
    pub async fn submit(
        db: &PgPool,
        caller: &AuthUser,
        dto: SubmitLeaveDto,
    ) -> Result<LeaveRequest, AppError> {
        let kind = caller.role().member_kind().ok_or_else(|| {
            AppError::forbidden(format!("Role '{}' cannot apply for leave", caller.role()))
        })?;

        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"WITH l AS (
                   INSERT INTO leave_requests (applicant_id, kind, leave_date, reason)
                   VALUES ($1, $2, $3, $4)
                   RETURNING *
               )
               SELECT {LEAVE_FIELDS} FROM l JOIN users u ON u.id = l.applicant_id"#
        ))
        .bind(caller.id())
        .bind(kind)
        .bind(dto.leave_date)
        .bind(dto.reason.trim())
        .fetch_one(db)
        .await
        .map_err(|e| caller_reference_error(e, "leave_requests_applicant_id_fkey"))?;

        track_leave_submitted(kind.as_str());
        tracing::info!(leave_id = %request.id, kind = kind.as_str(), "Leave request submitted");

        Ok(request)
    }

    /// Moves a pending request to its final state. The UPDATE only matches
    /// pending rows, so of two racing decisions exactly one succeeds.
    #[instrument(skip(db, caller), fields(decided_by = %caller.id()))]
    pub async fn decide(
        db: &PgPool,
        caller: &AuthUser,
        id: Uuid,
        dto: DecideLeaveDto,
    ) -> Result<LeaveRequest, AppError> {
        let target = LeaveStatus::Pending
            .apply(dto.outcome)
            .map_err(AppError::conflict)?;

        let decided = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"WITH l AS (
                   UPDATE leave_requests
                   SET status = $2, decided_by = $3, decided_at = NOW()
                   WHERE id = $1 AND status = 'pending'
                   RETURNING *
               )
               SELECT {LEAVE_FIELDS} FROM l JOIN users u ON u.id = l.applicant_id"#
        ))
        .bind(id)
        .bind(target)
        .bind(caller.id())
        .fetch_optional(db)
        .await?;

        if let Some(request) = decided {
            track_leave_decided(dto.outcome.as_str());
            tracing::info!(
                leave_id = %request.id,
                status = request.status.as_str(),
                "Leave request decided"
            );
            return Ok(request);
        }

        let current = sqlx::query_scalar::<_, LeaveStatus>(
            "SELECT status FROM leave_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Leave request not found")))?;

        match current.apply(dto.outcome) {
            Err(already) => {
                tracing::warn!(leave_id = %id, status = current.as_str(), "Leave request already decided");
                Err(AppError::conflict(already))
            }
            Ok(_) => Err(AppError::conflict(anyhow::anyhow!(
                "Leave request changed while being decided, retry"
            ))),
        }
    }

    /// The applicant's own requests, newest first.
    #[instrument(skip(db))]
    pub async fn list_for_applicant(
        db: &PgPool,
        applicant_id: Uuid,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"SELECT {LEAVE_FIELDS}
               FROM leave_requests l JOIN users u ON u.id = l.applicant_id
               WHERE l.applicant_id = $1
               ORDER BY l.created_at DESC, l.id"#
        ))
        .bind(applicant_id)
        .fetch_all(db)
        .await?;

        Ok(requests)
    }

    /// Pending requests, oldest first.
    #[instrument(skip(db))]
    pub async fn list_pending(
        db: &PgPool,
        params: LeaveQueueParams,
    ) -> Result<Paginated<LeaveRequest>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM leave_requests l
               WHERE l.status = 'pending' AND ($1::member_kind IS NULL OR l.kind = $1)"#,
        )
        .bind(params.kind)
        .fetch_one(db)
        .await?;

        let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"SELECT {LEAVE_FIELDS}
               FROM leave_requests l JOIN users u ON u.id = l.applicant_id
               WHERE l.status = 'pending' AND ($1::member_kind IS NULL OR l.kind = $1)
               ORDER BY l.created_at ASC, l.id
               LIMIT $2 OFFSET $3"#
        ))
        .bind(params.kind)
        .bind(params.pagination.limit())
        .bind(params.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated::new(requests, total, &params.pagination))
    }

    /// Every request, newest first.
    #[instrument(skip(db))]
    pub async fn list_all(
        db: &PgPool,
        filters: LeaveFilterParams,
    ) -> Result<Paginated<LeaveRequest>, AppError> {
        let where_clause = r#"WHERE ($1::member_kind IS NULL OR l.kind = $1)
              AND ($2::leave_status IS NULL OR l.status = $2)"#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM leave_requests l {where_clause}"
        ))
        .bind(filters.kind)
        .bind(filters.status)
        .fetch_one(db)
        .await?;

        let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"SELECT {LEAVE_FIELDS}
               FROM leave_requests l JOIN users u ON u.id = l.applicant_id
               {where_clause}
               ORDER BY l.created_at DESC, l.id
               LIMIT $3 OFFSET $4"#
        ))
        .bind(filters.kind)
        .bind(filters.status)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(Paginated::new(requests, total, &filters.pagination))
    }
}
