//! # CampusDesk Cache
//!
//! Optional Redis cache. The API runs without it; when enabled it holds the
//! per-(subject, session) attendance counts behind the summary endpoint.

pub mod config;
pub mod keys;
pub mod redis;

pub use config::CacheConfig;
pub use keys::invalidate;
pub use redis::{CacheError, RedisCache};
