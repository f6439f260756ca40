use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    get_daily_log, get_marked_dates, get_my_summary, get_roster, get_student_summary,
    get_subject_summary, mark_attendance,
};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(mark_attendance))
        .route("/roster", get(get_roster))
        .route("/daily", get(get_daily_log))
        .route("/dates", get(get_marked_dates))
        .route("/summary", get(get_subject_summary))
        .route("/summary/me", get(get_my_summary))
        .route("/summary/students/{id}", get(get_student_summary))
}
