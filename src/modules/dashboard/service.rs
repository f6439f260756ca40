use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use campusdesk_auth::Role;
use campusdesk_core::AppError;
use campusdesk_models::attendance::AttendanceTally;

use crate::middleware::auth::AuthUser;
use crate::modules::users::service::UserService;

use super::model::{
    AdminDashboard, AdminTotals, CourseBreakdown, Dashboard, LeaveCounts, StaffDashboard,
    StudentDashboard, SubjectActivity,
};

pub struct DashboardService;

impl DashboardService {
    #[instrument(skip(db, caller), fields(user_id = %caller.id(), role = %caller.role()))]
    pub async fn get_dashboard(db: &PgPool, caller: &AuthUser) -> Result<Dashboard, AppError> {
        let dashboard = match caller.role() {
            Role::Administrator => Dashboard::Administrator(Self::admin(db).await?),
            Role::Staff => Dashboard::Staff(Self::staff(db, caller.id()).await?),
            Role::Student => Dashboard::Student(Self::student(db, caller.id()).await?),
        };
        Ok(dashboard)
    }

    async fn admin(db: &PgPool) -> Result<AdminDashboard, AppError> {
        let totals = sqlx::query_as::<_, AdminTotals>(
            r#"SELECT
                   (SELECT COUNT(*) FROM users WHERE role = 'student') AS students,
                   (SELECT COUNT(*) FROM users WHERE role = 'staff') AS staff,
                   (SELECT COUNT(*) FROM courses) AS courses,
                   (SELECT COUNT(*) FROM subjects) AS subjects,
                   (SELECT COUNT(*) FROM academic_sessions) AS sessions,
                   (SELECT COUNT(*) FROM leave_requests
                     WHERE status = 'pending' AND kind = 'staff') AS pending_staff_leave,
                   (SELECT COUNT(*) FROM leave_requests
                     WHERE status = 'pending' AND kind = 'student') AS pending_student_leave,
                   (SELECT COUNT(*) FROM feedback_messages WHERE reply IS NULL) AS unanswered_feedback"#,
        )
        .fetch_one(db)
        .await?;

        let courses = sqlx::query_as::<_, CourseBreakdown>(
            r#"SELECT c.id AS course_id, c.name AS course_name,
                      (SELECT COUNT(*) FROM subjects s WHERE s.course_id = c.id) AS subject_count,
                      (SELECT COUNT(*) FROM student_enrollments e WHERE e.course_id = c.id) AS student_count
               FROM courses c
               ORDER BY c.name"#,
        )
        .fetch_all(db)
        .await?;

        Ok(AdminDashboard { totals, courses })
    }

    async fn leave_counts(db: &PgPool, applicant_id: Uuid) -> Result<LeaveCounts, AppError> {
        let counts = sqlx::query_as::<_, LeaveCounts>(
            r#"SELECT COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                      COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                      COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
               FROM leave_requests
               WHERE applicant_id = $1"#,
        )
        .bind(applicant_id)
        .fetch_one(db)
        .await?;

        Ok(counts)
    }

    async fn staff(db: &PgPool, staff_id: Uuid) -> Result<StaffDashboard, AppError> {
        let subjects = sqlx::query_as::<_, SubjectActivity>(
            r#"SELECT s.id AS subject_id, s.name AS subject_name, c.name AS course_name,
                      (SELECT COUNT(*) FROM student_enrollments e
                        WHERE e.course_id = s.course_id) AS student_count,
                      (SELECT COUNT(*) FROM attendance_days d
                        WHERE d.subject_id = s.id) AS attendance_days
               FROM subjects s
               JOIN courses c ON c.id = s.course_id
               WHERE s.staff_id = $1
               ORDER BY c.name, s.name"#,
        )
        .bind(staff_id)
        .fetch_all(db)
        .await?;

        let (students_taught, attendance_days_taken) = sqlx::query_as::<_, (i64, i64)>(
            r#"SELECT
                   (SELECT COUNT(DISTINCT e.user_id)
                      FROM student_enrollments e
                      JOIN subjects s ON s.course_id = e.course_id
                     WHERE s.staff_id = $1),
                   (SELECT COUNT(*) FROM attendance_days WHERE taken_by = $1)"#,
        )
        .bind(staff_id)
        .fetch_one(db)
        .await?;

        Ok(StaffDashboard {
            subjects_taught: subjects.len() as i64,
            students_taught,
            attendance_days_taken,
            leave: Self::leave_counts(db, staff_id).await?,
            subjects,
        })
    }

    async fn student(db: &PgPool, student_id: Uuid) -> Result<StudentDashboard, AppError> {
        let enrollment = UserService::get_enrollment(db, student_id).await?;

        let (subject_count, total, present, feedback_sent, results_recorded) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                r#"SELECT
                       (SELECT COUNT(*) FROM subjects s
                          JOIN student_enrollments e ON e.course_id = s.course_id
                         WHERE e.user_id = $1),
                       (SELECT COUNT(*) FROM attendance_records WHERE student_id = $1),
                       (SELECT COUNT(*) FROM attendance_records WHERE student_id = $1 AND present),
                       (SELECT COUNT(*) FROM feedback_messages WHERE author_id = $1),
                       (SELECT COUNT(*) FROM exam_results WHERE student_id = $1)"#,
            )
            .bind(student_id)
            .fetch_one(db)
            .await?;

        Ok(StudentDashboard {
            enrollment,
            subject_count,
            attendance: AttendanceTally::new(present, total),
            leave: Self::leave_counts(db, student_id).await?,
            feedback_sent,
            results_recorded,
        })
    }
}
