pub use campusdesk_models::courses::{Course, CourseDto, CourseFilterParams};
