// ABOUTME: Database-backed daily rate limiting for raw credential reads
// ABOUTME: Computes RFC-style rate-limit headers and retry-after values per UTC day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Daily rate limiting
//!
//! The counter lives in the `rate_limits` table keyed by `(user, UTC date)`
//! and is incremented through a server-side function, so it survives restarts
//! and stays correct under horizontal scaling. Counting failures never block
//! the guarded request.

use crate::database::Database;
use chrono::{DateTime, Duration, Utc};

/// Raw-credential reads allowed per user per UTC day
pub const DAILY_RAW_CREDENTIAL_LIMIT: i32 = 200;

/// Rate-limit decision with header material
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Whether the request must be rejected
    pub is_limited: bool,
    /// Window limit
    pub limit: i32,
    /// Requests remaining in the window
    pub remaining: i32,
    /// When the window resets (next UTC midnight)
    pub reset_at: DateTime<Utc>,
}

impl RateLimitStatus {
    /// Seconds until the window resets, for `Retry-After`
    #[must_use]
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.reset_at - now).num_seconds().max(0)
    }
}

/// Next UTC midnight after `now`
#[must_use]
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let next_day = now.date_naive() + Duration::days(1);
    DateTime::from_naive_utc_and_offset(next_day.and_hms_opt(0, 0, 0).unwrap_or_default(), Utc)
}

/// Daily per-user rate limiter over the database counter
pub struct DailyRateLimiter {
    database: Database,
    limit: i32,
}

impl DailyRateLimiter {
    /// Create a limiter with the standard daily limit
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self {
            database,
            limit: DAILY_RAW_CREDENTIAL_LIMIT,
        }
    }

    /// Atomically count this request and decide whether it may proceed
    ///
    /// The increment happens first (it is the atomic step); the decision
    /// follows from the post-increment count, so the `limit + 1`-th call in
    /// a window is the first rejected one. A counting failure is logged and
    /// the request is allowed through.
    pub async fn check_and_increment(&self, user_id: &str, now: DateTime<Utc>) -> RateLimitStatus {
        let reset_at = next_utc_midnight(now);

        let count = match self
            .database
            .increment_rate_limit(user_id, now.date_naive())
            .await
        {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(user_id = %user_id, "Rate-limit increment failed, allowing request: {e}");
                return RateLimitStatus {
                    is_limited: false,
                    limit: self.limit,
                    remaining: self.limit,
                    reset_at,
                };
            }
        };

        RateLimitStatus {
            is_limited: count > self.limit,
            limit: self.limit,
            remaining: (self.limit - count).max(0),
            reset_at,
        }
    }
}
