pub use campusdesk_models::dashboard::{
    AdminDashboard, AdminTotals, CourseBreakdown, Dashboard, StaffDashboard, StudentDashboard,
    SubjectActivity,
};
pub use campusdesk_models::leave::LeaveCounts;
