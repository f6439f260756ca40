use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use uuid::Uuid;

use campusdesk_auth::Role;
use campusdesk_core::AppError;

use crate::middleware::auth::{
    RequireListMarkedDates, RequireMarkAttendance, RequireViewDailyLog, RequireViewOwnSummary,
    RequireViewRoster, RequireViewStudentSummary, RequireViewSubjectSummary,
};
use crate::middleware::role::ensure_self_or_admin;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::{ParsedQuery, ValidatedJson};

use super::model::{
    DailyLog, DailyLogQuery, MarkAttendanceAck, MarkAttendanceDto, MarkedDate, RosterStudent,
    StudentSummary, SubjectSessionQuery, SubjectSummary,
};
use super::service::AttendanceService;

/// Record one day of attendance for a subject, replacing any earlier marks for that day
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendanceDto,
    responses(
        (status = 200, description = "Day stored", body = MarkAttendanceAck),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller does not teach the subject", body = ErrorResponse),
        (status = 404, description = "Subject or session not found", body = ErrorResponse),
        (status = 422, description = "Date refused or batch invalid", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn mark_attendance(
    State(state): State<AppState>,
    RequireMarkAttendance(caller): RequireMarkAttendance,
    ValidatedJson(dto): ValidatedJson<MarkAttendanceDto>,
) -> Result<Json<MarkAttendanceAck>, AppError> {
    let ack = AttendanceService::mark_attendance(
        &state.db,
        state.cache.as_ref(),
        &state.attendance_policy,
        &caller,
        dto,
    )
    .await?;
    Ok(Json(ack))
}

/// Students enrolled in the subject's course for the session
#[utoipa::path(
    get,
    path = "/api/attendance/roster",
    params(SubjectSessionQuery),
    responses(
        (status = 200, description = "Roster", body = Vec<RosterStudent>),
        (status = 403, description = "Staff or administrator only", body = ErrorResponse),
        (status = 404, description = "Subject or session not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_roster(
    State(state): State<AppState>,
    RequireViewRoster(_caller): RequireViewRoster,
    ParsedQuery(query): ParsedQuery<SubjectSessionQuery>,
) -> Result<Json<Vec<RosterStudent>>, AppError> {
    let roster = AttendanceService::get_roster(&state.db, query).await?;
    Ok(Json(roster))
}

#[utoipa::path(
    get,
    path = "/api/attendance/daily",
    params(DailyLogQuery),
    responses(
        (status = 200, description = "Marks for the day, empty if never marked", body = DailyLog),
        (status = 403, description = "Caller does not teach the subject", body = ErrorResponse),
        (status = 404, description = "Subject or session not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_daily_log(
    State(state): State<AppState>,
    RequireViewDailyLog(caller): RequireViewDailyLog,
    ParsedQuery(query): ParsedQuery<DailyLogQuery>,
) -> Result<Json<DailyLog>, AppError> {
    let log = AttendanceService::get_daily_log(&state.db, &caller, query).await?;
    Ok(Json(log))
}

#[utoipa::path(
    get,
    path = "/api/attendance/dates",
    params(SubjectSessionQuery),
    responses(
        (status = 200, description = "Marked days, newest first", body = Vec<MarkedDate>),
        (status = 403, description = "Caller does not teach the subject", body = ErrorResponse),
        (status = 404, description = "Subject or session not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_marked_dates(
    State(state): State<AppState>,
    RequireListMarkedDates(caller): RequireListMarkedDates,
    ParsedQuery(query): ParsedQuery<SubjectSessionQuery>,
) -> Result<Json<Vec<MarkedDate>>, AppError> {
    let dates = AttendanceService::get_marked_dates(&state.db, &caller, query).await?;
    Ok(Json(dates))
}

/// Per-student tallies for a subject and session
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(SubjectSessionQuery),
    responses(
        (status = 200, description = "One row per roster student", body = SubjectSummary),
        (status = 403, description = "Caller does not teach the subject", body = ErrorResponse),
        (status = 404, description = "Subject or session not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_subject_summary(
    State(state): State<AppState>,
    RequireViewSubjectSummary(caller): RequireViewSubjectSummary,
    ParsedQuery(query): ParsedQuery<SubjectSessionQuery>,
) -> Result<Json<SubjectSummary>, AppError> {
    let summary =
        AttendanceService::get_subject_summary(&state.db, state.cache.as_ref(), &caller, query)
            .await?;
    Ok(Json(summary))
}

/// Per-subject tallies for one student. Students may only read their own.
#[utoipa::path(
    get,
    path = "/api/attendance/summary/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student summary", body = StudentSummary),
        (status = 403, description = "Another student's records", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_summary(
    State(state): State<AppState>,
    RequireViewStudentSummary(caller): RequireViewStudentSummary,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentSummary>, AppError> {
    if caller.role() == Role::Student {
        ensure_self_or_admin(&caller, id)?;
    }
    let summary = AttendanceService::get_student_summary(&state.db, id).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/attendance/summary/me",
    responses(
        (status = 200, description = "Caller's own summary", body = StudentSummary),
        (status = 403, description = "Students only", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_summary(
    State(state): State<AppState>,
    RequireViewOwnSummary(caller): RequireViewOwnSummary,
) -> Result<Json<StudentSummary>, AppError> {
    let summary = AttendanceService::get_student_summary(&state.db, caller.id()).await?;
    Ok(Json(summary))
}
