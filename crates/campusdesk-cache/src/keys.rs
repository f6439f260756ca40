//! Cache key builders and invalidation helpers.
//!
//! Keys are relative; [`RedisCache`] prepends the configured prefix.

use tracing::warn;
use uuid::Uuid;

use crate::RedisCache;

fn build_key(parts: &[&str]) -> String {
    parts.join(":")
}

pub mod attendance {
    use super::*;

    /// Per-student counts for a (subject, session) at a given write revision.
    ///
    /// The revision grows on every committed mark and on every user deletion
    /// that removes records from the pair, so a stale entry is never read back
    /// even if invalidation failed.
    pub fn summary(subject_id: Uuid, session_id: Uuid, revision: i64) -> String {
        build_key(&[
            "attendance",
            "summary",
            &subject_id.to_string(),
            &session_id.to_string(),
            &format!("r{}", revision),
        ])
    }

    pub fn summary_pattern(subject_id: Uuid, session_id: Uuid) -> String {
        build_key(&[
            "attendance",
            "summary",
            &subject_id.to_string(),
            &session_id.to_string(),
            "*",
        ])
    }

    pub fn all_summaries_pattern() -> String {
        build_key(&["attendance", "summary", "*"])
    }
}

pub mod invalidate {
    use super::*;

    /// Drop cached summaries for one (subject, session) after a mark.
    pub async fn attendance_summary(cache: Option<&RedisCache>, subject_id: Uuid, session_id: Uuid) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache
            .invalidate_pattern(&attendance::summary_pattern(subject_id, session_id))
            .await
        {
            warn!(error = %e, %subject_id, %session_id, "Failed to invalidate attendance summary cache");
        }
    }

    /// Drop every cached summary, e.g. after a user deletion cascaded into records.
    pub async fn all_attendance_summaries(cache: Option<&RedisCache>) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache
            .invalidate_pattern(&attendance::all_summaries_pattern())
            .await
        {
            warn!(error = %e, "Failed to invalidate attendance summary caches");
        }
    }
}
