//! Leave requests and their Pending → Approved | Rejected lifecycle.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use campusdesk_auth::MemberKind;
use campusdesk_core::PaginationParams;

use crate::ids::{LeaveRequestId, UserId};

pub const MAX_REASON_LEN: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "leave_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaveOutcome {
    Approve,
    Reject,
}

impl LeaveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveOutcome::Approve => "approve",
            LeaveOutcome::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyDecided(pub LeaveStatus);

impl fmt::Display for AlreadyDecided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Leave request has already been {}", self.0.as_str())
    }
}

impl std::error::Error for AlreadyDecided {}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }

    /// The status after an administrator's decision. Only Pending moves.
    pub fn apply(self, outcome: LeaveOutcome) -> Result<LeaveStatus, AlreadyDecided> {
        match (self, outcome) {
            (LeaveStatus::Pending, LeaveOutcome::Approve) => Ok(LeaveStatus::Approved),
            (LeaveStatus::Pending, LeaveOutcome::Reject) => Ok(LeaveStatus::Rejected),
            (decided, _) => Err(AlreadyDecided(decided)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub applicant_id: UserId,
    pub applicant_name: String,
    pub kind: MemberKind,
    #[schema(value_type = String, format = Date)]
    pub leave_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub decided_by: Option<UserId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitLeaveDto {
    #[schema(value_type = String, format = Date, example = "2024-02-14")]
    pub leave_date: NaiveDate,
    #[validate(
        length(min = 1, max = MAX_REASON_LEN),
        custom(function = "not_blank")
    )]
    #[schema(example = "Family event")]
    pub reason: String,
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DecideLeaveDto {
    pub outcome: LeaveOutcome,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveQueueParams {
    pub kind: Option<MemberKind>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilterParams {
    pub kind: Option<MemberKind>,
    pub status: Option<LeaveStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct LeaveCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}
