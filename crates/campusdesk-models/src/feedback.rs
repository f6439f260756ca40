use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use campusdesk_auth::MemberKind;
use campusdesk_core::PaginationParams;

use crate::ids::{FeedbackId, UserId};
use crate::leave::not_blank;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FeedbackMessage {
    pub id: FeedbackId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_kind: MemberKind,
    pub message: String,
    /// Set once by an administrator
    pub reply: Option<String>,
    pub replied_by: Option<UserId>,
    pub replied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFeedbackDto {
    #[validate(length(min = 1, max = 2000), custom(function = "not_blank"))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReplyFeedbackDto {
    #[validate(length(min = 1, max = 2000), custom(function = "not_blank"))]
    pub reply: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedbackFilterParams {
    pub kind: Option<MemberKind>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
