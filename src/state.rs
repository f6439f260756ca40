use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use campusdesk_cache::{CacheConfig, RedisCache};
use campusdesk_config::{
    AttendancePolicy, CorsConfig, JwtConfig, RateLimitConfig, RegistrationConfig,
};

use crate::middleware::rate_limit::RateLimiters;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub rate_limiters: Arc<RateLimiters>,
    pub attendance_policy: AttendancePolicy,
    pub registration_config: RegistrationConfig,
    pub cache: Option<RedisCache>,
}

impl AppState {
    /// State with every setting at its default and no cache. Tests build on this.
    pub fn with_defaults(db: PgPool, jwt_config: JwtConfig) -> Self {
        let rate_limit_config = RateLimitConfig::default();
        Self {
            db,
            jwt_config,
            cors_config: CorsConfig::default(),
            rate_limiters: Arc::new(RateLimiters::new(&rate_limit_config)),
            rate_limit_config,
            attendance_policy: AttendancePolicy::default(),
            registration_config: RegistrationConfig::default(),
            cache: None,
        }
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limiters = Arc::new(RateLimiters::new(&config));
        self.rate_limit_config = config;
        self
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db = campusdesk_db::init_db_pool()
        .await
        .context("Failed to connect to database")?;
    campusdesk_db::run_migrations(&db)
        .await
        .context("Failed to run migrations")?;

    let cache_config = CacheConfig::from_env();
    let cache = if cache_config.enabled {
        match RedisCache::connect(&cache_config).await {
            Ok(cache) => {
                tracing::info!(prefix = %cache_config.key_prefix, "Redis cache connected");
                Some(cache)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, continuing without cache");
                None
            }
        }
    } else {
        None
    };

    let rate_limit_config = RateLimitConfig::from_env();

    Ok(AppState {
        db,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limiters: Arc::new(RateLimiters::new(&rate_limit_config)),
        rate_limit_config,
        attendance_policy: AttendancePolicy::from_env(),
        registration_config: RegistrationConfig::from_env(),
        cache,
    })
}
