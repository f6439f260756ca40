//! Academic sessions: a calendar year range scoping enrollment and attendance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::ids::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicSession {
    pub id: SessionId,
    pub start_year: i32,
    pub end_year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AcademicSession {
    pub fn label(&self) -> String {
        format!("{}-{}", self.start_year, self.end_year)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_year_order"))]
pub struct SessionDto {
    #[validate(range(min = 1900, max = 2200))]
    #[schema(example = 2023)]
    pub start_year: i32,
    #[validate(range(min = 1900, max = 2200))]
    #[schema(example = 2024)]
    pub end_year: i32,
}

fn validate_year_order(dto: &SessionDto) -> Result<(), ValidationError> {
    if dto.end_year < dto.start_year {
        return Err(ValidationError::new("year_order")
            .with_message("end_year must not be before start_year".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_order() {
        let same = SessionDto {
            start_year: 2024,
            end_year: 2024,
        };
        assert!(same.validate().is_ok());

        let reversed = SessionDto {
            start_year: 2024,
            end_year: 2023,
        };
        assert!(reversed.validate().is_err());
    }

    #[test]
    fn test_label() {
        let session = AcademicSession {
            id: SessionId::new(),
            start_year: 2023,
            end_year: 2024,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(session.label(), "2023-2024");
    }
}
