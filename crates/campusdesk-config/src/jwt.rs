use crate::env_or;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expiry: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "campusdesk-dev-secret-change-me".to_string()),
            access_token_expiry: env_or("JWT_ACCESS_EXPIRY", 3600),
            refresh_token_expiry: env_or("JWT_REFRESH_EXPIRY", 604_800),
        }
    }
}
