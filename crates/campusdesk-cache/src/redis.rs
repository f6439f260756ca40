//! JSON-over-Redis cache client.
//!
//! Reads never fail: a Redis or decode error is logged and reported as a miss,
//! so callers always fall back to the database.

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::config::CacheConfig;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    prefix: String,
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RedisCache {
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            prefix: config.key_prefix.clone(),
            default_ttl: config.default_ttl(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let key = self.full_key(key);
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(cache.key = %key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    error!(cache.key = %key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                debug!(cache.key = %key, "Cache miss");
                None
            }
            Err(e) => {
                error!(cache.key = %key, error = %e, "Redis GET failed");
                None
            }
        }
    }

    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set_with_ttl<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let key = self.full_key(key);
        let json = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();

        conn.set_ex::<_, _, ()>(&key, json, ttl.as_secs().max(1)).await?;
        debug!(cache.key = %key, cache.ttl_secs = ttl.as_secs(), "Cache set");
        Ok(())
    }

    /// Deletes every key matching `pattern` (relative to the prefix) using SCAN.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let pattern = self.full_key(pattern);
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                deleted += conn.del::<_, u64>(&keys).await?;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = deleted, "Pattern invalidated");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Counts {
        total: i64,
        present: i64,
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_set_get_and_invalidate() {
        let config = CacheConfig {
            enabled: true,
            key_prefix: "campusdesk-test".into(),
            ..CacheConfig::default()
        };
        let cache = RedisCache::connect(&config).await.unwrap();

        let value = Counts { total: 3, present: 2 };
        cache.set("attendance:summary:x:y:r1", &value).await.unwrap();
        assert_eq!(cache.get::<Counts>("attendance:summary:x:y:r1").await, Some(value));

        let deleted = cache.invalidate_pattern("attendance:summary:x:y:*").await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(cache.get::<Counts>("attendance:summary:x:y:r1").await, None);
    }
}
