use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use sqlx::PgPool;

use campusdesk_auth::{CallerIdentity, Role, authenticate};
use campusdesk_core::AppError;
use campusdesk_models::UserId;

use crate::state::AppState;

/// Extractor that validates the bearer JWT and provides the caller's identity.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub CallerIdentity);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn user_id(&self) -> UserId {
        UserId::from(self.0.id)
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }
}

pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))
}

/// Decodes the bearer token without touching the database.
pub(crate) fn token_identity(parts: &Parts, state: &AppState) -> Result<CallerIdentity, AppError> {
    let token = bearer_token(parts)?;
    authenticate(token, &state.jwt_config)
}

/// Confirms the token's subject still exists and still holds the claimed role.
///
/// Tokens outlive account deletion, so a valid signature alone is not enough.
pub(crate) async fn confirm_account(
    db: &PgPool,
    identity: CallerIdentity,
) -> Result<AuthUser, AppError> {
    let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
        .bind(identity.id)
        .fetch_optional(db)
        .await?;

    match role {
        Some(role) if role == identity.role => Ok(AuthUser(identity)),
        Some(_) => Err(AppError::unauthorized("Account role has changed; log in again")),
        None => Err(AppError::unauthorized("Account no longer exists")),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = token_identity(parts, state)?;
        confirm_account(&state.db, identity).await
    }
}

/// Declares an extractor that authenticates the caller and then runs the
/// authorization gate for one [`campusdesk_auth::Operation`]. A handler taking
/// the extractor only runs once both passed.
///
/// The role check runs on the token alone; the account lookup follows, so
/// callers outside the role set are refused without a query.
#[macro_export]
macro_rules! require_operation {
    ($name:ident, $operation:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = campusdesk_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let identity = $crate::middleware::auth::token_identity(parts, state)?;
                let operation = $operation;

                if let Err(err) = campusdesk_auth::authorize(&identity, operation) {
                    tracing::warn!(
                        user_id = %identity.id,
                        role = %identity.role,
                        operation = operation.name(),
                        "Authorization denied"
                    );
                    $crate::metrics::track_authorization_check(false, identity.role.as_str());
                    return Err(err);
                }

                let auth_user =
                    $crate::middleware::auth::confirm_account(&state.db, identity).await?;
                $crate::metrics::track_authorization_check(true, identity.role.as_str());
                Ok($name(auth_user))
            }
        }
    };
}

use campusdesk_auth::Operation;

// Attendance
require_operation!(RequireMarkAttendance, Operation::MarkAttendance);
require_operation!(RequireViewRoster, Operation::ViewRoster);
require_operation!(RequireViewDailyLog, Operation::ViewDailyLog);
require_operation!(RequireListMarkedDates, Operation::ListMarkedDates);
require_operation!(RequireViewStudentSummary, Operation::ViewStudentSummary);
require_operation!(RequireViewOwnSummary, Operation::ViewOwnSummary);
require_operation!(RequireViewSubjectSummary, Operation::ViewSubjectSummary);

// Leave
require_operation!(RequireSubmitLeave, Operation::SubmitLeave);
require_operation!(RequireDecideLeave, Operation::DecideLeave);
require_operation!(RequireListOwnLeave, Operation::ListOwnLeave);
require_operation!(RequireListLeaveQueue, Operation::ListLeaveQueue);
require_operation!(RequireListAllLeave, Operation::ListAllLeave);

// Feedback
require_operation!(RequireSubmitFeedback, Operation::SubmitFeedback);
require_operation!(RequireListOwnFeedback, Operation::ListOwnFeedback);
require_operation!(RequireListAllFeedback, Operation::ListAllFeedback);
require_operation!(RequireReplyFeedback, Operation::ReplyFeedback);

// Results
require_operation!(RequireUpsertResult, Operation::UpsertResult);
require_operation!(RequireListResults, Operation::ListResults);
require_operation!(RequireListOwnResults, Operation::ListOwnResults);

// Catalog
require_operation!(RequireManageCatalog, Operation::ManageCatalog);
require_operation!(RequireViewCatalog, Operation::ViewCatalog);
require_operation!(RequireListOwnSubjects, Operation::ListOwnSubjects);

// Users
require_operation!(RequireManageUsers, Operation::ManageUsers);
require_operation!(RequireViewProfile, Operation::ViewProfile);
require_operation!(RequireViewDashboard, Operation::ViewDashboard);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/profile");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_is_unauthenticated() {
        let parts = parts_with(None);
        assert_eq!(bearer_token(&parts).unwrap_err().status.as_u16(), 401);
    }

    #[test]
    fn test_wrong_scheme_is_unauthenticated() {
        let parts = parts_with(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts).unwrap_err().status.as_u16(), 401);
    }

    #[test]
    fn test_auth_user_accessors() {
        let id = Uuid::new_v4();
        let user = AuthUser(CallerIdentity {
            id,
            role: Role::Administrator,
        });
        assert_eq!(user.id(), id);
        assert_eq!(user.user_id().into_inner(), id);
        assert!(user.is_admin());
    }
}
