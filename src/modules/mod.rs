pub mod attendance;
pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod feedback;
pub mod leave;
pub mod results;
pub mod sessions;
pub mod subjects;
pub mod users;

use campusdesk_core::AppError;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Maps a foreign-key failure on `constraint`, a column referencing the
/// caller's own user row, to Unauthenticated. The account was deleted after
/// its token was checked.
pub(crate) fn caller_reference_error(err: sqlx::Error, constraint: &str) -> AppError {
    let caller_gone = matches!(
        &err,
        sqlx::Error::Database(db_err)
            if db_err.is_foreign_key_violation() && db_err.constraint() == Some(constraint)
    );
    if caller_gone {
        AppError::unauthorized("Account no longer exists")
    } else {
        AppError::from(err)
    }
}
