//! Users, enrollment and profile DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use campusdesk_auth::Role;
use campusdesk_core::PaginationParams;

use crate::ids::{CourseId, SessionId, UserId};
use crate::value_types::Email;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Row used only for credential checks; never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
    pub password: String,
}

/// Role implied by the tag at the end of an email's local part.
///
/// `ada.staff@…` is Staff, `ada.student@…` a Student and `ada.admin@…` or
/// `ada.hod@…` an Administrator. Untagged addresses have no role.
pub fn role_from_email(email: &Email) -> Option<Role> {
    match email.tag()? {
        "staff" => Some(Role::Staff),
        "student" => Some(Role::Student),
        "admin" | "hod" => Some(Role::Administrator),
        _ => None,
    }
}

/// Administrator-created account. Students may be enrolled on creation.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_user"))]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub email: Email,
    #[validate(length(min = 8))]
    #[schema(example = "password123")]
    pub password: String,
    pub role: Role,
    pub course_id: Option<CourseId>,
    pub session_id: Option<SessionId>,
}

fn validate_create_user(dto: &CreateUserDto) -> Result<(), ValidationError> {
    match (dto.role, dto.course_id, dto.session_id) {
        (Role::Student, None, None) | (Role::Student, Some(_), Some(_)) => Ok(()),
        (Role::Student, _, _) => Err(ValidationError::new("enrollment")
            .with_message("course_id and session_id must be given together".into())),
        (_, None, None) => Ok(()),
        _ => Err(ValidationError::new("enrollment")
            .with_message("only students can be enrolled".into())),
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    pub role: Option<Role>,
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetEnrollmentDto {
    pub course_id: CourseId,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub student_id: UserId,
    pub course_id: CourseId,
    pub course_name: String,
    pub session_id: SessionId,
    pub session_start_year: i32,
    pub session_end_year: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub landing: String,
    /// Present for enrolled students only
    pub enrollment: Option<Enrollment>,
}
