//! # CampusDesk Config
//!
//! Environment-driven configuration. Every struct exposes `from_env()`, which
//! reads the process environment (after `dotenvy::dotenv()` in the binary) and
//! falls back to defaults for unset or unparsable values.
//!
//! - [`jwt`]: token signing secret and lifetimes
//! - [`cors`]: allowed browser origins
//! - [`rate_limit`]: per-IP request quotas
//! - [`attendance`]: which dates staff may record attendance for
//! - [`registration`]: public self-registration switches
//! - [`server`]: listener addresses

pub mod attendance;
pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod registration;
pub mod server;

pub use attendance::AttendancePolicy;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use registration::RegistrationConfig;
pub use server::ServerConfig;

use std::str::FromStr;

/// Parses `key` from the environment, using `default` when unset or invalid.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(std::env::var(key).ok(), default)
}

pub(crate) fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or(Some("42".into()), 7u32), 42);
        assert_eq!(parse_or(Some(" 42 ".into()), 7u32), 42);
        assert_eq!(parse_or(Some("abc".into()), 7u32), 7);
        assert_eq!(parse_or::<u32>(None, 7), 7);
        assert!(!parse_or(Some("false".into()), true));
    }
}
