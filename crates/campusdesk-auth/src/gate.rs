//! Authorization gate.
//!
//! Every API operation is a variant of [`Operation`] and declares the roles
//! allowed to invoke it in [`Operation::required_roles`]. Handlers never run
//! unless [`authorize`] accepted the caller first. Ownership checks (the
//! subject's teacher, a student's own records) happen later in services and
//! fail the same way.

use uuid::Uuid;

use campusdesk_config::JwtConfig;
use campusdesk_core::AppError;

use crate::jwt::verify_token;
use crate::roles::Role;
use crate::roles::Role::{Administrator as A, Staff as T, Student as S};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    MarkAttendance,
    ViewRoster,
    ViewDailyLog,
    ListMarkedDates,
    ViewStudentSummary,
    ViewOwnSummary,
    ViewSubjectSummary,

    SubmitLeave,
    DecideLeave,
    ListOwnLeave,
    ListLeaveQueue,
    ListAllLeave,

    SubmitFeedback,
    ListOwnFeedback,
    ListAllFeedback,
    ReplyFeedback,

    UpsertResult,
    ListResults,
    ListOwnResults,

    ManageCatalog,
    ViewCatalog,
    ListOwnSubjects,

    ManageUsers,
    ViewProfile,
    ViewDashboard,
}

impl Operation {
    pub const ALL: [Operation; 25] = [
        Operation::MarkAttendance,
        Operation::ViewRoster,
        Operation::ViewDailyLog,
        Operation::ListMarkedDates,
        Operation::ViewStudentSummary,
        Operation::ViewOwnSummary,
        Operation::ViewSubjectSummary,
        Operation::SubmitLeave,
        Operation::DecideLeave,
        Operation::ListOwnLeave,
        Operation::ListLeaveQueue,
        Operation::ListAllLeave,
        Operation::SubmitFeedback,
        Operation::ListOwnFeedback,
        Operation::ListAllFeedback,
        Operation::ReplyFeedback,
        Operation::UpsertResult,
        Operation::ListResults,
        Operation::ListOwnResults,
        Operation::ManageCatalog,
        Operation::ViewCatalog,
        Operation::ListOwnSubjects,
        Operation::ManageUsers,
        Operation::ViewProfile,
        Operation::ViewDashboard,
    ];

    /// Roles allowed to invoke the operation.
    pub const fn required_roles(self) -> &'static [Role] {
        match self {
            Operation::MarkAttendance
            | Operation::ViewRoster
            | Operation::ViewDailyLog
            | Operation::ListMarkedDates
            | Operation::ViewSubjectSummary
            | Operation::UpsertResult => &[T, A],
            Operation::ViewStudentSummary | Operation::ListResults => &[S, T, A],
            Operation::ViewOwnSummary | Operation::ListOwnResults => &[S],

            Operation::SubmitLeave
            | Operation::ListOwnLeave
            | Operation::SubmitFeedback
            | Operation::ListOwnFeedback => &[T, S],
            Operation::DecideLeave
            | Operation::ListLeaveQueue
            | Operation::ListAllLeave
            | Operation::ListAllFeedback
            | Operation::ReplyFeedback
            | Operation::ManageCatalog
            | Operation::ManageUsers => &[A],

            Operation::ListOwnSubjects => &[T],
            Operation::ViewCatalog | Operation::ViewProfile | Operation::ViewDashboard => {
                &[A, T, S]
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::MarkAttendance => "mark_attendance",
            Operation::ViewRoster => "view_roster",
            Operation::ViewDailyLog => "view_daily_log",
            Operation::ListMarkedDates => "list_marked_dates",
            Operation::ViewStudentSummary => "view_student_summary",
            Operation::ViewOwnSummary => "view_own_summary",
            Operation::ViewSubjectSummary => "view_subject_summary",
            Operation::SubmitLeave => "submit_leave",
            Operation::DecideLeave => "decide_leave",
            Operation::ListOwnLeave => "list_own_leave",
            Operation::ListLeaveQueue => "list_leave_queue",
            Operation::ListAllLeave => "list_all_leave",
            Operation::SubmitFeedback => "submit_feedback",
            Operation::ListOwnFeedback => "list_own_feedback",
            Operation::ListAllFeedback => "list_all_feedback",
            Operation::ReplyFeedback => "reply_feedback",
            Operation::UpsertResult => "upsert_result",
            Operation::ListResults => "list_results",
            Operation::ListOwnResults => "list_own_results",
            Operation::ManageCatalog => "manage_catalog",
            Operation::ViewCatalog => "view_catalog",
            Operation::ListOwnSubjects => "list_own_subjects",
            Operation::ManageUsers => "manage_users",
            Operation::ViewProfile => "view_profile",
            Operation::ViewDashboard => "view_dashboard",
        }
    }
}

/// Who is making the request, as established by a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub id: Uuid,
    pub role: Role,
}

impl CallerIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }
}

/// Decodes a bearer token into the caller's identity.
pub fn authenticate(token: &str, jwt_config: &JwtConfig) -> Result<CallerIdentity, AppError> {
    let claims = verify_token(token, jwt_config)?;
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;

    Ok(CallerIdentity {
        id,
        role: claims.role,
    })
}

pub fn role_allowed(allowed: &[Role], role: Role) -> bool {
    allowed.contains(&role)
}

pub fn authorize(caller: &CallerIdentity, operation: Operation) -> Result<(), AppError> {
    if role_allowed(operation.required_roles(), caller.role) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Role '{}' may not perform {}",
            caller.role,
            operation.name()
        )))
    }
}
