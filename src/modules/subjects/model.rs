pub use campusdesk_models::subjects::{
    CreateSubjectDto, Subject, SubjectFilterParams, UpdateSubjectDto,
};
