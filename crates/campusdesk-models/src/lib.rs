//! # CampusDesk Models
//!
//! Entities, request/response DTOs and the pure domain rules of the
//! CampusDesk API. Nothing here touches the database directly; rows derive
//! `sqlx::FromRow` and services in the API crate run the queries.
//!
//! - [`attendance`]: batch validation and summary math
//! - [`leave`]: the leave request state machine
//! - [`results`]: exam marks and the pass threshold
//! - [`users`]: accounts, enrollment and the email role tag

pub mod attendance;
pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod feedback;
pub mod ids;
pub mod leave;
pub mod results;
pub mod sessions;
pub mod subjects;
pub mod users;
pub mod value_types;

pub use ids::{
    AttendanceDayId, CourseId, ExamResultId, FeedbackId, LeaveRequestId, SessionId, SubjectId,
    UserId,
};
pub use value_types::Email;
