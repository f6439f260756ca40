//! Role-shaped dashboard payloads. The `role` field tells the client which one it got.

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::attendance::AttendanceTally;
use crate::ids::{CourseId, SubjectId};
use crate::leave::LeaveCounts;
use crate::users::Enrollment;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
    Administrator(AdminDashboard),
    Staff(StaffDashboard),
    Student(StudentDashboard),
}

#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
pub struct AdminTotals {
    pub students: i64,
    pub staff: i64,
    pub courses: i64,
    pub subjects: i64,
    pub sessions: i64,
    pub pending_staff_leave: i64,
    pub pending_student_leave: i64,
    pub unanswered_feedback: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CourseBreakdown {
    pub course_id: CourseId,
    pub course_name: String,
    pub subject_count: i64,
    pub student_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminDashboard {
    pub totals: AdminTotals,
    pub courses: Vec<CourseBreakdown>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SubjectActivity {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub course_name: String,
    pub student_count: i64,
    pub attendance_days: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StaffDashboard {
    pub subjects_taught: i64,
    pub students_taught: i64,
    pub attendance_days_taken: i64,
    pub leave: LeaveCounts,
    pub subjects: Vec<SubjectActivity>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentDashboard {
    pub enrollment: Option<Enrollment>,
    pub subject_count: i64,
    pub attendance: AttendanceTally,
    pub leave: LeaveCounts,
    pub feedback_sent: i64,
    pub results_recorded: i64,
}
