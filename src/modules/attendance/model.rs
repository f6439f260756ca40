pub use campusdesk_models::attendance::{
    AttendanceEntry, AttendanceTally, CurrentSubject, DailyLog, DailyLogEntry, DailyLogQuery,
    MarkAttendanceAck, MarkAttendanceDto, MarkedDate, RosterStudent, StudentAttendance,
    StudentCount, StudentSummary, SubjectAttendance, SubjectCount, SubjectSessionQuery,
    SubjectSummary, merge_student_summary, merge_subject_summary, validate_batch,
};
