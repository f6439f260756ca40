//! Attendance records and the summaries derived from them.
//!
//! A marked day is a header row per (subject, session, date) plus one row per
//! student. Summaries are never stored; they are recomputed from those rows
//! and merged with the current roster so every roster student gets a row.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{AttendanceDayId, SessionId, SubjectId, UserId};

/// Percentage of present days, rounded half-up. Zero when nothing was recorded.
pub fn attendance_percent(present: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    let present = present.clamp(0, total);
    (present * 200 + total) / (total * 2)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceTally {
    pub total_days: i64,
    pub present_days: i64,
    pub absent_days: i64,
    /// 0-100
    pub percent: i64,
}

impl AttendanceTally {
    pub fn new(present: i64, total: i64) -> Self {
        let total = total.max(0);
        let present = present.clamp(0, total);
        Self {
            total_days: total,
            present_days: present,
            absent_days: total - present,
            percent: attendance_percent(present, total),
        }
    }

    pub fn add(self, other: AttendanceTally) -> Self {
        Self::new(
            self.present_days + other.present_days,
            self.total_days + other.total_days,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct AttendanceEntry {
    pub student_id: UserId,
    pub present: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkAttendanceDto {
    pub subject_id: SubjectId,
    pub session_id: SessionId,
    #[schema(value_type = String, format = Date, example = "2024-01-10")]
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    Empty,
    DuplicateStudent(UserId),
    NotInRoster(UserId),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Empty => f.write_str("Attendance batch is empty"),
            BatchError::DuplicateStudent(id) => {
                write!(f, "Student {} appears more than once in the batch", id)
            }
            BatchError::NotInRoster(id) => {
                write!(f, "Student {} is not enrolled for this subject and session", id)
            }
        }
    }
}

impl std::error::Error for BatchError {}

/// Checks a whole batch before anything is written.
pub fn validate_batch(
    entries: &[AttendanceEntry],
    roster: &HashSet<UserId>,
) -> Result<(), BatchError> {
    if entries.is_empty() {
        return Err(BatchError::Empty);
    }

    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.student_id) {
            return Err(BatchError::DuplicateStudent(entry.student_id));
        }
        if !roster.contains(&entry.student_id) {
            return Err(BatchError::NotInRoster(entry.student_id));
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkAttendanceAck {
    pub day_id: AttendanceDayId,
    pub subject_id: SubjectId,
    pub session_id: SessionId,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub present: usize,
    pub absent: usize,
    /// Times this day has been written, starting at 1
    pub revision: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubjectSessionQuery {
    pub subject_id: SubjectId,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyLogQuery {
    pub subject_id: SubjectId,
    pub session_id: SessionId,
    #[param(value_type = String, format = Date)]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RosterStudent {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DailyLogEntry {
    pub student_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub present: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyLog {
    pub subject_id: SubjectId,
    pub session_id: SessionId,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    /// Empty when the day was never marked
    pub entries: Vec<DailyLogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MarkedDate {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub present: i64,
    pub absent: i64,
    pub taken_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
}

/// Per-student counts for one (subject, session). This is what the summary cache holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StudentCount {
    pub student_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub total: i64,
    pub present: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StudentAttendance {
    pub student_id: UserId,
    pub first_name: String,
    pub last_name: String,
    #[serde(flatten)]
    pub tally: AttendanceTally,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubjectSummary {
    pub subject_id: SubjectId,
    pub session_id: SessionId,
    pub students: Vec<StudentAttendance>,
}

/// One row per roster student (zeros when unrecorded) plus any student who
/// holds records but has since left the roster. Sorted by name.
pub fn merge_subject_summary(
    roster: Vec<RosterStudent>,
    counts: Vec<StudentCount>,
) -> Vec<StudentAttendance> {
    let mut by_student: HashMap<UserId, StudentCount> =
        counts.into_iter().map(|c| (c.student_id, c)).collect();

    let mut rows: Vec<StudentAttendance> = roster
        .into_iter()
        .map(|student| {
            let tally = by_student
                .remove(&student.id)
                .map(|c| AttendanceTally::new(c.present, c.total))
                .unwrap_or_default();
            StudentAttendance {
                student_id: student.id,
                first_name: student.first_name,
                last_name: student.last_name,
                tally,
            }
        })
        .collect();

    rows.extend(by_student.into_values().map(|c| StudentAttendance {
        student_id: c.student_id,
        first_name: c.first_name,
        last_name: c.last_name,
        tally: AttendanceTally::new(c.present, c.total),
    }));

    rows.sort_by(|a, b| {
        (&a.last_name, &a.first_name, a.student_id).cmp(&(&b.last_name, &b.first_name, b.student_id))
    });
    rows
}

/// Per-subject counts for one student across every session they have records in.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SubjectCount {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub session_id: SessionId,
    pub total: i64,
    pub present: i64,
}

/// A subject the student currently studies, in their current session.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CurrentSubject {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubjectAttendance {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub session_id: SessionId,
    #[serde(flatten)]
    pub tally: AttendanceTally,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentSummary {
    pub student_id: UserId,
    pub subjects: Vec<SubjectAttendance>,
    pub overall: AttendanceTally,
}

/// Recorded rows plus a zero row for every current subject without records.
pub fn merge_student_summary(
    student_id: UserId,
    counts: Vec<SubjectCount>,
    current: Vec<CurrentSubject>,
) -> StudentSummary {
    let recorded: HashSet<(SubjectId, SessionId)> =
        counts.iter().map(|c| (c.subject_id, c.session_id)).collect();

    let mut subjects: Vec<SubjectAttendance> = counts
        .into_iter()
        .map(|c| SubjectAttendance {
            subject_id: c.subject_id,
            subject_name: c.subject_name,
            session_id: c.session_id,
            tally: AttendanceTally::new(c.present, c.total),
        })
        .collect();

    subjects.extend(
        current
            .into_iter()
            .filter(|s| !recorded.contains(&(s.subject_id, s.session_id)))
            .map(|s| SubjectAttendance {
                subject_id: s.subject_id,
                subject_name: s.subject_name,
                session_id: s.session_id,
                tally: AttendanceTally::default(),
            }),
    );

    subjects.sort_by(|a, b| {
        (&a.subject_name, a.subject_id, a.session_id).cmp(&(&b.subject_name, b.subject_id, b.session_id))
    });

    let overall = subjects
        .iter()
        .fold(AttendanceTally::default(), |acc, s| acc.add(s.tally));

    StudentSummary {
        student_id,
        subjects,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_zero_total() {
        assert_eq!(attendance_percent(0, 0), 0);
        assert_eq!(attendance_percent(5, 0), 0);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(attendance_percent(1, 1), 100);
        assert_eq!(attendance_percent(0, 1), 0);
        assert_eq!(attendance_percent(1, 2), 50);
        assert_eq!(attendance_percent(1, 3), 33);
        assert_eq!(attendance_percent(2, 3), 67);
        assert_eq!(attendance_percent(1, 8), 13);
        assert_eq!(attendance_percent(1, 200), 1);
        assert_eq!(attendance_percent(1, 201), 0);
    }

    #[test]
    fn test_percent_always_in_range() {
        for total in 0..60 {
            for present in -2..=total + 2 {
                let p = attendance_percent(present, total);
                assert!((0..=100).contains(&p), "{present}/{total} gave {p}");
            }
        }
    }

    #[test]
    fn test_tally() {
        let t = AttendanceTally::new(3, 4);
        assert_eq!(t.total_days, 4);
        assert_eq!(t.present_days, 3);
        assert_eq!(t.absent_days, 1);
        assert_eq!(t.percent, 75);
        assert_eq!(AttendanceTally::default().percent, 0);
        assert_eq!(t.add(AttendanceTally::new(0, 4)).percent, 38);
    }

    fn roster_ids(ids: &[UserId]) -> HashSet<UserId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_batch_validation() {
        let a = UserId::new();
        let b = UserId::new();
        let outsider = UserId::new();
        let roster = roster_ids(&[a, b]);

        let ok = [
            AttendanceEntry { student_id: a, present: true },
            AttendanceEntry { student_id: b, present: false },
        ];
        assert!(validate_batch(&ok, &roster).is_ok());

        assert_eq!(validate_batch(&[], &roster), Err(BatchError::Empty));

        let dup = [
            AttendanceEntry { student_id: a, present: true },
            AttendanceEntry { student_id: a, present: false },
        ];
        assert_eq!(validate_batch(&dup, &roster), Err(BatchError::DuplicateStudent(a)));

        let stranger = [AttendanceEntry { student_id: outsider, present: true }];
        assert_eq!(
            validate_batch(&stranger, &roster),
            Err(BatchError::NotInRoster(outsider))
        );
    }

    fn student(last: &str) -> RosterStudent {
        RosterStudent {
            id: UserId::new(),
            first_name: "S".into(),
            last_name: last.into(),
            email: format!("{}.student@campus.test", last.to_lowercase()),
        }
    }

    #[test]
    fn test_subject_summary_includes_unrecorded_roster_students() {
        let recorded = student("Alpha");
        let unrecorded = student("Beta");
        let counts = vec![StudentCount {
            student_id: recorded.id,
            first_name: "S".into(),
            last_name: "Alpha".into(),
            total: 1,
            present: 1,
        }];

        let rows = merge_subject_summary(vec![unrecorded.clone(), recorded.clone()], counts);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_id, recorded.id);
        assert_eq!(rows[0].tally, AttendanceTally::new(1, 1));
        assert_eq!(rows[1].student_id, unrecorded.id);
        assert_eq!(rows[1].tally, AttendanceTally::default());
    }

    #[test]
    fn test_subject_summary_keeps_students_who_left_roster() {
        let former = StudentCount {
            student_id: UserId::new(),
            first_name: "F".into(),
            last_name: "Former".into(),
            total: 2,
            present: 1,
        };
        let rows = merge_subject_summary(vec![], vec![former.clone()]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, former.student_id);
        assert_eq!(rows[0].tally.percent, 50);
    }

    #[test]
    fn test_student_summary_zero_rows_for_current_subjects() {
        let me = UserId::new();
        let session = SessionId::new();
        let maths = SubjectId::new();
        let physics = SubjectId::new();

        let counts = vec![SubjectCount {
            subject_id: maths,
            subject_name: "Maths".into(),
            session_id: session,
            total: 4,
            present: 3,
        }];
        let current = vec![
            CurrentSubject {
                subject_id: maths,
                subject_name: "Maths".into(),
                session_id: session,
            },
            CurrentSubject {
                subject_id: physics,
                subject_name: "Physics".into(),
                session_id: session,
            },
        ];

        let summary = merge_student_summary(me, counts, current);
        assert_eq!(summary.subjects.len(), 2);
        assert_eq!(summary.subjects[0].subject_id, maths);
        assert_eq!(summary.subjects[0].tally.percent, 75);
        assert_eq!(summary.subjects[1].subject_id, physics);
        assert_eq!(summary.subjects[1].tally, AttendanceTally::default());
        assert_eq!(summary.overall, AttendanceTally::new(3, 4));
    }

    #[test]
    fn test_student_summary_with_nothing_is_empty_not_error() {
        let summary = merge_student_summary(UserId::new(), vec![], vec![]);
        assert!(summary.subjects.is_empty());
        assert_eq!(summary.overall, AttendanceTally::default());
    }
}
