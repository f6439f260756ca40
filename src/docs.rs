use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use campusdesk_auth::{MemberKind, Role};
use campusdesk_core::pagination::{PaginationMeta, PaginationParams};

use crate::modules::attendance::model::{
    AttendanceEntry, AttendanceTally, DailyLog, DailyLogEntry, MarkAttendanceAck,
    MarkAttendanceDto, MarkedDate, RosterStudent, StudentAttendance, StudentSummary,
    SubjectAttendance, SubjectSummary,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest};
use crate::modules::courses::model::{Course, CourseDto};
use crate::modules::dashboard::model::{
    AdminDashboard, AdminTotals, CourseBreakdown, Dashboard, LeaveCounts, StaffDashboard,
    StudentDashboard, SubjectActivity,
};
use crate::modules::feedback::model::{CreateFeedbackDto, FeedbackMessage, ReplyFeedbackDto};
use crate::modules::leave::model::{
    DecideLeaveDto, LeaveOutcome, LeaveRequest, LeaveStatus, SubmitLeaveDto,
};
use crate::modules::results::model::{ExamResult, UpsertResultDto};
use crate::modules::sessions::model::{AcademicSession, SessionDto};
use crate::modules::subjects::model::{CreateSubjectDto, Subject, UpdateSubjectDto};
use crate::modules::users::model::{CreateUserDto, Enrollment, SetEnrollmentDto, User, UserProfile};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::set_enrollment,
        crate::modules::users::controller::get_profile,
        crate::modules::dashboard::controller::get_dashboard,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::sessions::controller::create_session,
        crate::modules::sessions::controller::get_sessions,
        crate::modules::sessions::controller::get_session,
        crate::modules::sessions::controller::update_session,
        crate::modules::sessions::controller::delete_session,
        crate::modules::subjects::controller::create_subject,
        crate::modules::subjects::controller::get_subjects,
        crate::modules::subjects::controller::get_my_subjects,
        crate::modules::subjects::controller::get_subject,
        crate::modules::subjects::controller::update_subject,
        crate::modules::subjects::controller::delete_subject,
        crate::modules::attendance::controller::mark_attendance,
        crate::modules::attendance::controller::get_roster,
        crate::modules::attendance::controller::get_daily_log,
        crate::modules::attendance::controller::get_marked_dates,
        crate::modules::attendance::controller::get_subject_summary,
        crate::modules::attendance::controller::get_student_summary,
        crate::modules::attendance::controller::get_my_summary,
        crate::modules::leave::controller::submit_leave,
        crate::modules::leave::controller::decide_leave,
        crate::modules::leave::controller::get_my_leave,
        crate::modules::leave::controller::get_leave_queue,
        crate::modules::leave::controller::get_all_leave,
        crate::modules::feedback::controller::create_feedback,
        crate::modules::feedback::controller::get_my_feedback,
        crate::modules::feedback::controller::get_all_feedback,
        crate::modules::feedback::controller::reply_feedback,
        crate::modules::results::controller::upsert_result,
        crate::modules::results::controller::get_results,
        crate::modules::results::controller::get_my_results,
    ),
    components(
        schemas(
            ErrorResponse,
            Role,
            MemberKind,
            PaginationParams,
            PaginationMeta,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            User,
            CreateUserDto,
            SetEnrollmentDto,
            Enrollment,
            UserProfile,
            Course,
            CourseDto,
            AcademicSession,
            SessionDto,
            Subject,
            CreateSubjectDto,
            UpdateSubjectDto,
            AttendanceEntry,
            AttendanceTally,
            MarkAttendanceDto,
            MarkAttendanceAck,
            RosterStudent,
            DailyLog,
            DailyLogEntry,
            MarkedDate,
            StudentAttendance,
            SubjectSummary,
            SubjectAttendance,
            StudentSummary,
            LeaveStatus,
            LeaveOutcome,
            LeaveRequest,
            SubmitLeaveDto,
            DecideLeaveDto,
            LeaveCounts,
            FeedbackMessage,
            CreateFeedbackDto,
            ReplyFeedbackDto,
            ExamResult,
            UpsertResultDto,
            Dashboard,
            AdminDashboard,
            AdminTotals,
            CourseBreakdown,
            StaffDashboard,
            StudentDashboard,
            SubjectActivity,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token refresh"),
        (name = "Users", description = "Account management and the caller's profile"),
        (name = "Dashboard", description = "Role-shaped landing page counts"),
        (name = "Courses", description = "Course catalog"),
        (name = "Sessions", description = "Academic sessions"),
        (name = "Subjects", description = "Subjects and their teachers"),
        (name = "Attendance", description = "Marking attendance and reading summaries"),
        (name = "Leave", description = "Leave requests and decisions"),
        (name = "Feedback", description = "Feedback to administrators"),
        (name = "Results", description = "Examination marks")
    ),
    info(
        title = "CampusDesk API",
        version = "0.1.0",
        description = "Academic administration backend: attendance, leave, feedback and results for administrators, staff and students.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_module() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users/{id}/enrollment",
            "/api/attendance",
            "/api/attendance/summary/me",
            "/api/leave/{id}/decision",
            "/api/feedback/{id}/reply",
            "/api/results",
            "/api/dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
