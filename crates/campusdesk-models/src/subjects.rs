use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use campusdesk_core::PaginationParams;
use campusdesk_core::serde::deserialize_optional_uuid;

use crate::ids::{CourseId, SubjectId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub course_id: CourseId,
    pub course_name: String,
    pub staff_id: UserId,
    pub staff_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSubjectDto {
    #[validate(length(min = 1, max = 120))]
    #[schema(example = "Data Structures")]
    pub name: String,
    pub course_id: CourseId,
    /// Must reference a Staff user
    pub staff_id: UserId,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateSubjectDto {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub course_id: Option<CourseId>,
    pub staff_id: Option<UserId>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubjectFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub course_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub staff_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
