//! Per-client request quotas.
//!
//! Two buckets are configured: a general one for every `/api` route and a
//! stricter one for `/api/auth`. Each bucket refills `per_second` tokens every
//! second and holds at most `burst_size` tokens.
//!
//! | Variable | Default |
//! |---|---|
//! | `RATE_LIMIT_ENABLED` | `true` |
//! | `RATE_LIMIT_GENERAL_PER_SECOND` | 20 |
//! | `RATE_LIMIT_GENERAL_BURST_SIZE` | 60 |
//! | `RATE_LIMIT_AUTH_PER_SECOND` | 1 |
//! | `RATE_LIMIT_AUTH_BURST_SIZE` | 5 |

use std::num::NonZeroU32;

use governor::Quota;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub general_per_second: u32,
    pub general_burst_size: u32,
    pub auth_per_second: u32,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 20,
            general_burst_size: 60,
            auth_per_second: 1,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            enabled: env_or("RATE_LIMIT_ENABLED", d.enabled),
            general_per_second: env_or("RATE_LIMIT_GENERAL_PER_SECOND", d.general_per_second),
            general_burst_size: env_or("RATE_LIMIT_GENERAL_BURST_SIZE", d.general_burst_size),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", d.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", d.auth_burst_size),
        }
    }

    /// Quota for general endpoints, `None` when limiting is off.
    #[must_use]
    pub fn general_quota(&self) -> Option<Quota> {
        self.quota(self.general_per_second, self.general_burst_size)
    }

    /// Quota for authentication endpoints, `None` when limiting is off.
    #[must_use]
    pub fn auth_quota(&self) -> Option<Quota> {
        self.quota(self.auth_per_second, self.auth_burst_size)
    }

    fn quota(&self, per_second: u32, burst: u32) -> Option<Quota> {
        if !self.enabled {
            return None;
        }
        // A zero rate is treated as the slowest possible refill.
        let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(rate);
        Some(Quota::per_second(rate).allow_burst(burst))
    }
}
