use axum::{Json, extract::State};
use tracing::instrument;

use campusdesk_core::AppError;

use crate::middleware::auth::{RequireListOwnResults, RequireListResults, RequireUpsertResult};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::{ParsedQuery, ValidatedJson};

use super::model::{ExamResult, ResultFilterParams, UpsertResultDto};
use super::service::ResultService;

/// Record or overwrite a student's mark for a subject
#[utoipa::path(
    put,
    path = "/api/results",
    request_body = UpsertResultDto,
    responses(
        (status = 200, description = "Result stored", body = ExamResult),
        (status = 403, description = "Caller does not teach the subject", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 422, description = "Marks out of range or student not enrolled", body = ErrorResponse)
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn upsert_result(
    State(state): State<AppState>,
    RequireUpsertResult(caller): RequireUpsertResult,
    ValidatedJson(dto): ValidatedJson<UpsertResultDto>,
) -> Result<Json<ExamResult>, AppError> {
    let result = ResultService::upsert(&state.db, &caller, dto).await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/results",
    params(ResultFilterParams),
    responses(
        (status = 200, description = "Matching results", body = Vec<ExamResult>),
        (status = 403, description = "Outside the caller's subjects or records", body = ErrorResponse),
        (status = 422, description = "Staff must name a subject", body = ErrorResponse)
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_results(
    State(state): State<AppState>,
    RequireListResults(caller): RequireListResults,
    ParsedQuery(filters): ParsedQuery<ResultFilterParams>,
) -> Result<Json<Vec<ExamResult>>, AppError> {
    let results = ResultService::list(&state.db, &caller, filters).await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/results/mine",
    responses(
        (status = 200, description = "Caller's results", body = Vec<ExamResult>),
        (status = 403, description = "Students only", body = ErrorResponse)
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_results(
    State(state): State<AppState>,
    RequireListOwnResults(caller): RequireListOwnResults,
) -> Result<Json<Vec<ExamResult>>, AppError> {
    let results = ResultService::list_for_student(&state.db, caller.id()).await?;
    Ok(Json(results))
}
