//! JWT claim sets.
//!
//! Access and refresh tokens carry disjoint required fields (`role` vs `jti`),
//! so one can never be decoded as the other.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::roles::Role;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique token id so two refresh tokens issued in the same second differ.
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roundtrip_role() {
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "ada.staff@campus.test".to_string(),
            role: Role::Staff,
            exp: 2_000_000_000,
            iat: 1_900_000_000,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains(r#""role":"staff""#));
        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::Staff);
    }

    #[test]
    fn test_refresh_claims_are_not_access_claims() {
        let json = r#"{"sub":"u","email":"e","exp":1,"iat":1,"jti":"x"}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
        assert!(serde_json::from_str::<RefreshTokenClaims>(json).is_ok());
    }
}
