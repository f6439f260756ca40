use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use campusdesk_core::{AppError, pagination::Paginated};

use crate::middleware::auth::{RequireManageUsers, RequireViewProfile};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::{ParsedQuery, ValidatedJson};

use super::model::{CreateUserDto, Enrollment, SetEnrollmentDto, User, UserFilterParams, UserProfile};
use super::service::UserService;

/// Create a user of any role, optionally enrolling a student
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireManageUsers(_caller): RequireManageUsers,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::create_user(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// List users, filtered by role or a name/email search
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Page of users", body = Paginated<User>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrator only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    RequireManageUsers(_caller): RequireManageUsers,
    ParsedQuery(filters): ParsedQuery<UserFilterParams>,
) -> Result<Json<Paginated<User>>, AppError> {
    let users = UserService::get_users(&state.db, filters).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    RequireManageUsers(_caller): RequireManageUsers,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, id).await?;
    Ok(Json(user))
}

/// Delete a user and everything they own
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User still teaches subjects, or is the caller", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireManageUsers(caller): RequireManageUsers,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    UserService::delete_user(&state.db, state.cache.as_ref(), caller.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set a student's course and session
#[utoipa::path(
    put,
    path = "/api/users/{id}/enrollment",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = SetEnrollmentDto,
    responses(
        (status = 200, description = "Enrollment saved", body = Enrollment),
        (status = 403, description = "Administrator only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Not a student, or unknown course/session", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn set_enrollment(
    State(state): State<AppState>,
    RequireManageUsers(_caller): RequireManageUsers,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<SetEnrollmentDto>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = UserService::set_enrollment(&state.db, id, dto).await?;
    Ok(Json(enrollment))
}

/// The caller's own account, with enrollment for students
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Caller's profile", body = UserProfile),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    RequireViewProfile(caller): RequireViewProfile,
) -> Result<Json<UserProfile>, AppError> {
    let profile = UserService::get_profile(&state.db, caller.id()).await?;
    Ok(Json(profile))
}
