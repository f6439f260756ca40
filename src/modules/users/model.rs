pub use campusdesk_models::users::{
    CreateUserDto, Enrollment, SetEnrollmentDto, User, UserFilterParams, UserProfile,
};
