use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use campusdesk_core::{AppError, pagination::Paginated};

use crate::middleware::auth::{RequireListOwnSubjects, RequireManageCatalog, RequireViewCatalog};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::{ParsedQuery, ValidatedJson};

use super::model::{CreateSubjectDto, Subject, SubjectFilterParams, UpdateSubjectDto};
use super::service::SubjectService;

/// Create a subject under a course and assign its teacher
#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body = CreateSubjectDto,
    responses(
        (status = 201, description = "Subject created", body = Subject),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 422, description = "Unknown course or non-staff teacher", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_subject(
    State(state): State<AppState>,
    RequireManageCatalog(_caller): RequireManageCatalog,
    ValidatedJson(dto): ValidatedJson<CreateSubjectDto>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let subject = SubjectService::create_subject(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

#[utoipa::path(
    get,
    path = "/api/subjects",
    params(SubjectFilterParams),
    responses(
        (status = 200, description = "Page of subjects", body = Paginated<Subject>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_subjects(
    State(state): State<AppState>,
    RequireViewCatalog(_caller): RequireViewCatalog,
    ParsedQuery(filters): ParsedQuery<SubjectFilterParams>,
) -> Result<Json<Paginated<Subject>>, AppError> {
    let subjects = SubjectService::get_subjects(&state.db, filters).await?;
    Ok(Json(subjects))
}

/// Subjects taught by the calling staff member
#[utoipa::path(
    get,
    path = "/api/subjects/mine",
    responses(
        (status = 200, description = "Caller's subjects", body = Vec<Subject>),
        (status = 403, description = "Staff only", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_subjects(
    State(state): State<AppState>,
    RequireListOwnSubjects(caller): RequireListOwnSubjects,
) -> Result<Json<Vec<Subject>>, AppError> {
    let subjects = SubjectService::get_staff_subjects(&state.db, caller.id()).await?;
    Ok(Json(subjects))
}

#[utoipa::path(
    get,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject details", body = Subject),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_subject(
    State(state): State<AppState>,
    RequireViewCatalog(_caller): RequireViewCatalog,
    Path(id): Path<Uuid>,
) -> Result<Json<Subject>, AppError> {
    let subject = SubjectService::get_subject(&state.db, id).await?;
    Ok(Json(subject))
}

#[utoipa::path(
    put,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    request_body = UpdateSubjectDto,
    responses(
        (status = 200, description = "Subject updated", body = Subject),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 422, description = "Unknown course or non-staff teacher", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_subject(
    State(state): State<AppState>,
    RequireManageCatalog(_caller): RequireManageCatalog,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSubjectDto>,
) -> Result<Json<Subject>, AppError> {
    let subject = SubjectService::update_subject(&state.db, id, dto).await?;
    Ok(Json(subject))
}

#[utoipa::path(
    delete,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_subject(
    State(state): State<AppState>,
    RequireManageCatalog(_caller): RequireManageCatalog,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    SubjectService::delete_subject(&state.db, state.cache.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
