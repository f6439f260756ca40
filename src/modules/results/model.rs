pub use campusdesk_models::results::{
    ExamResult, ExamResultRow, ResultFilterParams, UpsertResultDto, is_pass,
};
