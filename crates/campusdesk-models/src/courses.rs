use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use campusdesk_core::PaginationParams;

use crate::ids::CourseId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Used for both create and rename.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CourseDto {
    #[validate(length(min = 1, max = 120))]
    #[schema(example = "Computer Science")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    /// Case-insensitive substring match
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
