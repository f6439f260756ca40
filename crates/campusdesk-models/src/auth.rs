//! Registration, login and token refresh DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub use campusdesk_auth::{Claims, RefreshTokenClaims};

use crate::users::User;
use crate::value_types::Email;

/// Self-registration. The role comes from the email tag, see
/// [`crate::users::role_from_email`].
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[schema(example = "ada.student@campus.test")]
    pub email: Email,
    #[validate(length(min = 8))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    #[schema(example = "ada.staff@campus.test")]
    pub email: String,
    #[validate(length(min = 1))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Client dashboard for the user's role
    pub landing: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_rejects_bad_email_at_parse_time() {
        let json = r#"{"first_name":"A","last_name":"B","email":"nope","password":"password123"}"#;
        assert!(serde_json::from_str::<RegisterRequest>(json).is_err());
    }

    #[test]
    fn test_login_validation() {
        let ok = LoginRequest {
            email: "ada.staff@campus.test".into(),
            password: "x".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: "ada".into(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
