//! Route-group role checks.
//!
//! Per-handler gating goes through the extractors in
//! [`crate::middleware::auth`]. This layer guards whole routers where every
//! route shares one role set, e.g. `/api/users`. It reads the token only; the
//! handler extractors behind it confirm the account still exists.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use campusdesk_auth::{Operation, authorize};
use campusdesk_core::AppError;

use crate::middleware::auth::{AuthUser, token_identity};
use crate::state::AppState;

/// Runs the gate for `operation` before the inner service sees the request.
pub async fn require_operation(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    operation: Operation,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();

    let identity = token_identity(&parts, &state)?;
    if let Err(err) = authorize(&identity, operation) {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            operation = operation.name(),
            "Authorization denied"
        );
        crate::metrics::track_authorization_check(false, identity.role.as_str());
        return Err(err);
    }

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Administrator-only route groups.
///
/// ```rust,ignore
/// Router::new().nest(
///     "/users",
///     init_users_router().route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
/// )
/// ```
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_operation(State(state), req, next, Operation::ManageUsers).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Fails with Forbidden unless the caller is `owner` or an administrator.
pub fn ensure_self_or_admin(caller: &AuthUser, owner: uuid::Uuid) -> Result<(), AppError> {
    if caller.is_admin() || caller.id() == owner {
        Ok(())
    } else {
        Err(AppError::forbidden("You may only access your own records"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusdesk_auth::{CallerIdentity, Role};
    use uuid::Uuid;

    fn user(role: Role) -> AuthUser {
        AuthUser(CallerIdentity {
            id: Uuid::new_v4(),
            role,
        })
    }

    #[test]
    fn test_self_access_allowed() {
        let student = user(Role::Student);
        assert!(ensure_self_or_admin(&student, student.id()).is_ok());
    }

    #[test]
    fn test_other_student_forbidden() {
        let student = user(Role::Student);
        let err = ensure_self_or_admin(&student, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
    }

    #[test]
    fn test_admin_override() {
        assert!(ensure_self_or_admin(&user(Role::Administrator), Uuid::new_v4()).is_ok());
    }
}
