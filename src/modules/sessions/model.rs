pub use campusdesk_models::sessions::{AcademicSession, SessionDto};
