use campusdesk_auth::Role;

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub courses: usize,
    pub subjects_per_course: usize,
    pub staff: usize,
    pub students_per_course: usize,
    pub session_start_year: i32,
    /// Weekdays of attendance history to generate, counting back from today.
    pub attendance_days: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            courses: 3,
            subjects_per_course: 4,
            staff: 6,
            students_per_course: 20,
            session_start_year: 2024,
            attendance_days: 0,
        }
    }
}

impl SeedConfig {
    pub fn total_students(&self) -> usize {
        self.courses * self.students_per_course
    }

    pub fn total_subjects(&self) -> usize {
        self.courses * self.subjects_per_course
    }
}

pub struct UserSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

pub struct SubjectSeed {
    pub name: String,
    pub course_id: uuid::Uuid,
    pub staff_id: uuid::Uuid,
}
