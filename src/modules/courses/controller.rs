use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use campusdesk_cache::invalidate;
use campusdesk_core::{AppError, pagination::Paginated};

use crate::middleware::auth::{RequireManageCatalog, RequireViewCatalog};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::{ParsedQuery, ValidatedJson};

use super::model::{Course, CourseDto, CourseFilterParams};
use super::service::CourseService;

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_course(
    State(state): State<AppState>,
    RequireManageCatalog(_caller): RequireManageCatalog,
    ValidatedJson(dto): ValidatedJson<CourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CourseService::create_course(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "Page of courses", body = Paginated<Course>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_courses(
    State(state): State<AppState>,
    RequireViewCatalog(_caller): RequireViewCatalog,
    ParsedQuery(filters): ParsedQuery<CourseFilterParams>,
) -> Result<Json<Paginated<Course>>, AppError> {
    let courses = CourseService::get_courses(&state.db, filters).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course details", body = Course),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    RequireViewCatalog(_caller): RequireViewCatalog,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::get_course(&state.db, id).await?;
    Ok(Json(course))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CourseDto,
    responses(
        (status = 200, description = "Course renamed", body = Course),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_course(
    State(state): State<AppState>,
    RequireManageCatalog(_caller): RequireManageCatalog,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CourseDto>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::update_course(&state.db, id, dto).await?;
    Ok(Json(course))
}

/// Delete a course together with its subjects
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Students are still enrolled", body = ErrorResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    RequireManageCatalog(_caller): RequireManageCatalog,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    CourseService::delete_course(&state.db, id).await?;
    invalidate::all_attendance_summaries(state.cache.as_ref()).await;
    Ok(StatusCode::NO_CONTENT)
}
