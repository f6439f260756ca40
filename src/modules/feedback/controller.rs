use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use campusdesk_core::{AppError, pagination::Paginated};

use crate::middleware::auth::{
    RequireListAllFeedback, RequireListOwnFeedback, RequireReplyFeedback, RequireSubmitFeedback,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::{ParsedQuery, ValidatedJson};

use super::model::{CreateFeedbackDto, FeedbackFilterParams, FeedbackMessage, ReplyFeedbackDto};
use super::service::FeedbackService;

#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = CreateFeedbackDto,
    responses(
        (status = 201, description = "Feedback sent", body = FeedbackMessage),
        (status = 403, description = "Staff or students only", body = ErrorResponse),
        (status = 422, description = "Empty or too long", body = ErrorResponse)
    ),
    tag = "Feedback",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_feedback(
    State(state): State<AppState>,
    RequireSubmitFeedback(caller): RequireSubmitFeedback,
    ValidatedJson(dto): ValidatedJson<CreateFeedbackDto>,
) -> Result<(StatusCode, Json<FeedbackMessage>), AppError> {
    let feedback = FeedbackService::create(&state.db, &caller, dto).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

#[utoipa::path(
    get,
    path = "/api/feedback/mine",
    responses(
        (status = 200, description = "Caller's feedback, newest first", body = Vec<FeedbackMessage>),
        (status = 403, description = "Staff or students only", body = ErrorResponse)
    ),
    tag = "Feedback",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_feedback(
    State(state): State<AppState>,
    RequireListOwnFeedback(caller): RequireListOwnFeedback,
) -> Result<Json<Vec<FeedbackMessage>>, AppError> {
    let messages = FeedbackService::list_for_author(&state.db, caller.id()).await?;
    Ok(Json(messages))
}

#[utoipa::path(
    get,
    path = "/api/feedback",
    params(FeedbackFilterParams),
    responses(
        (status = 200, description = "Page of feedback, newest first", body = Paginated<FeedbackMessage>),
        (status = 403, description = "Administrator only", body = ErrorResponse)
    ),
    tag = "Feedback",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_all_feedback(
    State(state): State<AppState>,
    RequireListAllFeedback(_caller): RequireListAllFeedback,
    ParsedQuery(filters): ParsedQuery<FeedbackFilterParams>,
) -> Result<Json<Paginated<FeedbackMessage>>, AppError> {
    let messages = FeedbackService::list_all(&state.db, filters).await?;
    Ok(Json(messages))
}

#[utoipa::path(
    post,
    path = "/api/feedback/{id}/reply",
    params(("id" = Uuid, Path, description = "Feedback ID")),
    request_body = ReplyFeedbackDto,
    responses(
        (status = 200, description = "Reply stored", body = FeedbackMessage),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse),
        (status = 409, description = "Already answered", body = ErrorResponse)
    ),
    tag = "Feedback",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn reply_feedback(
    State(state): State<AppState>,
    RequireReplyFeedback(caller): RequireReplyFeedback,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ReplyFeedbackDto>,
) -> Result<Json<FeedbackMessage>, AppError> {
    let feedback = FeedbackService::reply(&state.db, &caller, id, dto).await?;
    Ok(Json(feedback))
}
