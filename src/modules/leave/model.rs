pub use campusdesk_models::leave::{
    DecideLeaveDto, LeaveFilterParams, LeaveOutcome, LeaveQueueParams, LeaveRequest, LeaveStatus,
    SubmitLeaveDto,
};
