pub use campusdesk_models::feedback::{
    CreateFeedbackDto, FeedbackFilterParams, FeedbackMessage, ReplyFeedbackDto,
};
