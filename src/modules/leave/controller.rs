use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use campusdesk_core::{AppError, pagination::Paginated};

use crate::middleware::auth::{
    RequireDecideLeave, RequireListAllLeave, RequireListLeaveQueue, RequireListOwnLeave,
    RequireSubmitLeave,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::{ParsedQuery, ValidatedJson};

use super::model::{DecideLeaveDto, LeaveFilterParams, LeaveQueueParams, LeaveRequest, SubmitLeaveDto};
use super::service::LeaveService;

#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = SubmitLeaveDto,
    responses(
        (status = 201, description = "Leave request pending", body = LeaveRequest),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Staff or students only", body = ErrorResponse),
        (status = 422, description = "Reason empty or too long", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn submit_leave(
    State(state): State<AppState>,
    RequireSubmitLeave(caller): RequireSubmitLeave,
    ValidatedJson(dto): ValidatedJson<SubmitLeaveDto>,
) -> Result<(StatusCode, Json<LeaveRequest>), AppError> {
    let request = LeaveService::submit(&state.db, &caller, dto).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Approve or reject a pending request
#[utoipa::path(
    post,
    path = "/api/leave/{id}/decision",
    params(("id" = Uuid, Path, description = "Leave request ID")),
    request_body = DecideLeaveDto,
    responses(
        (status = 200, description = "Leave request decided", body = LeaveRequest),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "Leave request not found", body = ErrorResponse),
        (status = 409, description = "Already decided", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn decide_leave(
    State(state): State<AppState>,
    RequireDecideLeave(caller): RequireDecideLeave,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<DecideLeaveDto>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request = LeaveService::decide(&state.db, &caller, id, dto).await?;
    Ok(Json(request))
}

#[utoipa::path(
    get,
    path = "/api/leave/mine",
    responses(
        (status = 200, description = "Caller's requests, newest first", body = Vec<LeaveRequest>),
        (status = 403, description = "Staff or students only", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_leave(
    State(state): State<AppState>,
    RequireListOwnLeave(caller): RequireListOwnLeave,
) -> Result<Json<Vec<LeaveRequest>>, AppError> {
    let requests = LeaveService::list_for_applicant(&state.db, caller.id()).await?;
    Ok(Json(requests))
}

/// Pending requests awaiting a decision, oldest first
#[utoipa::path(
    get,
    path = "/api/leave/queue",
    params(LeaveQueueParams),
    responses(
        (status = 200, description = "Page of pending requests", body = Paginated<LeaveRequest>),
        (status = 403, description = "Administrator only", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_leave_queue(
    State(state): State<AppState>,
    RequireListLeaveQueue(_caller): RequireListLeaveQueue,
    ParsedQuery(params): ParsedQuery<LeaveQueueParams>,
) -> Result<Json<Paginated<LeaveRequest>>, AppError> {
    let requests = LeaveService::list_pending(&state.db, params).await?;
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilterParams),
    responses(
        (status = 200, description = "Page of requests, newest first", body = Paginated<LeaveRequest>),
        (status = 403, description = "Administrator only", body = ErrorResponse)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_all_leave(
    State(state): State<AppState>,
    RequireListAllLeave(_caller): RequireListAllLeave,
    ParsedQuery(filters): ParsedQuery<LeaveFilterParams>,
) -> Result<Json<Paginated<LeaveRequest>>, AppError> {
    let requests = LeaveService::list_all(&state.db, filters).await?;
    Ok(Json(requests))
}
