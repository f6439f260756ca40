//! Token issuing and verification (HS256).

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use campusdesk_config::JwtConfig;
use campusdesk_core::AppError;

use crate::claims::{Claims, RefreshTokenClaims};
use crate::roles::Role;

fn expiry(now: i64, lifetime_secs: i64) -> usize {
    now.saturating_add(lifetime_secs).max(0) as usize
}

pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: Role,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        exp: expiry(now, jwt_config.access_token_expiry),
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Decodes an access token, checking signature and expiry.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}

pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: expiry(now, jwt_config.refresh_token_expiry),
        iat: now as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired refresh token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    #[test]
    fn test_access_token_carries_role() {
        let config = config();
        let user_id = Uuid::new_v4();
        let token =
            create_access_token(user_id, "grace.student@campus.test", Role::Student, &config)
                .unwrap();

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "grace.student@campus.test");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token =
            create_access_token(Uuid::new_v4(), "a@b.test", Role::Staff, &config()).unwrap();
        let other = JwtConfig {
            secret: "some-other-secret-of-reasonable-length".to_string(),
            ..config()
        };
        let err = verify_token(&token, &other).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let expired = JwtConfig {
            access_token_expiry: -3600,
            ..config()
        };
        let token = create_access_token(Uuid::new_v4(), "a@b.test", Role::Staff, &expired).unwrap();
        assert!(verify_token(&token, &config()).is_err());
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = config();
        let refresh = create_refresh_token(Uuid::new_v4(), "a@b.test", &config).unwrap();
        assert!(verify_refresh_token(&refresh, &config).is_ok());
        assert!(verify_token(&refresh, &config).is_err());

        let access = create_access_token(Uuid::new_v4(), "a@b.test", Role::Staff, &config).unwrap();
        assert!(verify_refresh_token(&access, &config).is_err());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let config = config();
        let id = Uuid::new_v4();
        let a = create_refresh_token(id, "a@b.test", &config).unwrap();
        let b = create_refresh_token(id, "a@b.test", &config).unwrap();
        assert_ne!(a, b);
    }
}
