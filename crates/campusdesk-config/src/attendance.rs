//! Date policy for recording attendance.

use chrono::{Datelike, NaiveDate};

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttendancePolicy {
    /// Refuse dates after the server's local today.
    pub reject_future_dates: bool,
    /// Refuse dates outside Jan 1 of the session's start year to Dec 31 of its end year.
    pub enforce_session_window: bool,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            reject_future_dates: true,
            enforce_session_window: false,
        }
    }
}

impl AttendancePolicy {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            reject_future_dates: env_or("ATTENDANCE_REJECT_FUTURE_DATES", d.reject_future_dates),
            enforce_session_window: env_or(
                "ATTENDANCE_ENFORCE_SESSION_WINDOW",
                d.enforce_session_window,
            ),
        }
    }

    /// Checks `date` against the policy, returning a user-facing reason on refusal.
    pub fn check(
        &self,
        date: NaiveDate,
        today: NaiveDate,
        session_start_year: i32,
        session_end_year: i32,
    ) -> Result<(), String> {
        if self.reject_future_dates && date > today {
            return Err(format!("Attendance date {date} is in the future"));
        }

        if self.enforce_session_window
            && (date.year() < session_start_year || date.year() > session_end_year)
        {
            return Err(format!(
                "Attendance date {date} is outside session {session_start_year}-{session_end_year}"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_default_rejects_future() {
        let policy = AttendancePolicy::default();
        let today = d(2024, 1, 10);
        assert!(policy.check(d(2024, 1, 10), today, 2023, 2024).is_ok());
        assert!(policy.check(d(2024, 1, 11), today, 2023, 2024).is_err());
    }

    #[test]
    fn test_default_ignores_session_window() {
        let policy = AttendancePolicy::default();
        assert!(policy.check(d(2019, 5, 1), d(2024, 1, 10), 2023, 2024).is_ok());
    }

    #[test]
    fn test_session_window() {
        let policy = AttendancePolicy {
            reject_future_dates: false,
            enforce_session_window: true,
        };
        let today = d(2020, 1, 1);
        assert!(policy.check(d(2023, 1, 1), today, 2023, 2024).is_ok());
        assert!(policy.check(d(2024, 12, 31), today, 2023, 2024).is_ok());
        assert!(policy.check(d(2022, 12, 31), today, 2023, 2024).is_err());
        assert!(policy.check(d(2025, 1, 1), today, 2023, 2024).is_err());
    }

    #[test]
    fn test_everything_allowed_when_disabled() {
        let policy = AttendancePolicy {
            reject_future_dates: false,
            enforce_session_window: false,
        };
        assert!(policy.check(d(2099, 1, 1), d(2024, 1, 1), 2023, 2024).is_ok());
    }
}
