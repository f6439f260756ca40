use std::env;
use std::time::Duration;

/// Redis cache settings.
///
/// | Variable | Default |
/// |---|---|
/// | `CACHE_ENABLED` | `false` |
/// | `REDIS_URL` | `redis://127.0.0.1:6379` |
/// | `CACHE_TTL_SECONDS` | `300` |
/// | `CACHE_PREFIX` | `campusdesk` |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub redis_url: String,
    pub default_ttl_seconds: u64,
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            redis_url: "redis://127.0.0.1:6379".into(),
            default_ttl_seconds: 300,
            key_prefix: "campusdesk".into(),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            enabled: env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.enabled),
            redis_url: env::var("REDIS_URL").unwrap_or(d.redis_url),
            default_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.default_ttl_seconds),
            key_prefix: env::var("CACHE_PREFIX").unwrap_or(d.key_prefix),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}
