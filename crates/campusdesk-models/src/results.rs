//! Examination marks. A mark of [`PASS_MARK`] or more passes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use campusdesk_core::serde::deserialize_optional_uuid;

use crate::ids::{ExamResultId, SubjectId, UserId};

pub const PASS_MARK: i32 = 40;

pub fn is_pass(marks: i32) -> bool {
    marks >= PASS_MARK
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ExamResultRow {
    pub id: ExamResultId,
    pub student_id: UserId,
    pub student_name: String,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub marks: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ExamResult {
    pub id: ExamResultId,
    pub student_id: UserId,
    pub student_name: String,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub marks: i32,
    pub passed: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<ExamResultRow> for ExamResult {
    fn from(row: ExamResultRow) -> Self {
        Self {
            passed: is_pass(row.marks),
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            marks: row.marks,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpsertResultDto {
    pub student_id: UserId,
    pub subject_id: SubjectId,
    #[validate(range(min = 0, max = 100))]
    #[schema(example = 72)]
    pub marks: i32,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_threshold() {
        assert!(!is_pass(0));
        assert!(!is_pass(39));
        assert!(is_pass(40));
        assert!(is_pass(100));
    }

    #[test]
    fn test_row_conversion_sets_passed() {
        let row = ExamResultRow {
            id: ExamResultId::new(),
            student_id: UserId::new(),
            student_name: "Grace Hopper".into(),
            subject_id: SubjectId::new(),
            subject_name: "Compilers".into(),
            marks: 39,
            updated_at: Utc::now(),
        };
        assert!(!ExamResult::from(row.clone()).passed);
        assert!(ExamResult::from(ExamResultRow { marks: 40, ..row }).passed);
    }

    #[test]
    fn test_marks_range() {
        let dto = |marks| UpsertResultDto {
            student_id: UserId::new(),
            subject_id: SubjectId::new(),
            marks,
        };
        assert!(dto(0).validate().is_ok());
        assert!(dto(100).validate().is_ok());
        assert!(dto(-1).validate().is_err());
        assert!(dto(101).validate().is_err());
    }
}
