use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use campusdesk_cache::invalidate;
use campusdesk_core::AppError;

use crate::middleware::auth::{RequireManageCatalog, RequireViewCatalog};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{AcademicSession, SessionDto};
use super::service::SessionService;

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = SessionDto,
    responses(
        (status = 201, description = "Academic session created", body = AcademicSession),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 422, description = "Years out of range or reversed", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_session(
    State(state): State<AppState>,
    RequireManageCatalog(_caller): RequireManageCatalog,
    ValidatedJson(dto): ValidatedJson<SessionDto>,
) -> Result<(StatusCode, Json<AcademicSession>), AppError> {
    let session = SessionService::create_session(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "All academic sessions, newest first", body = Vec<AcademicSession>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_sessions(
    State(state): State<AppState>,
    RequireViewCatalog(_caller): RequireViewCatalog,
) -> Result<Json<Vec<AcademicSession>>, AppError> {
    let sessions = SessionService::get_sessions(&state.db).await?;
    Ok(Json(sessions))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "Academic session ID")),
    responses(
        (status = 200, description = "Academic session", body = AcademicSession),
        (status = 404, description = "Academic session not found", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    RequireViewCatalog(_caller): RequireViewCatalog,
    Path(id): Path<Uuid>,
) -> Result<Json<AcademicSession>, AppError> {
    let session = SessionService::get_session(&state.db, id).await?;
    Ok(Json(session))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "Academic session ID")),
    request_body = SessionDto,
    responses(
        (status = 200, description = "Academic session updated", body = AcademicSession),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "Academic session not found", body = ErrorResponse),
        (status = 422, description = "Years out of range or reversed", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_session(
    State(state): State<AppState>,
    RequireManageCatalog(_caller): RequireManageCatalog,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<SessionDto>,
) -> Result<Json<AcademicSession>, AppError> {
    let session = SessionService::update_session(&state.db, id, dto).await?;
    Ok(Json(session))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "Academic session ID")),
    responses(
        (status = 204, description = "Academic session deleted"),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "Academic session not found", body = ErrorResponse),
        (status = 409, description = "Students are still enrolled", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    RequireManageCatalog(_caller): RequireManageCatalog,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    SessionService::delete_session(&state.db, id).await?;
    invalidate::all_attendance_summaries(state.cache.as_ref()).await;
    Ok(StatusCode::NO_CONTENT)
}
