// ABOUTME: Outbound platform OAuth CSRF state persistence
// ABOUTME: Single-use rows with a short TTL, consumed on provider callback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{Platform, PlatformOAuthState};
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::str::FromStr;

impl Database {
    /// Store an outbound CSRF state record
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn store_platform_state(&self, state: &PlatformOAuthState) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO platform_oauth_states (state, user_id, platform, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&state.state)
        .bind(&state.user_id)
        .bind(state.platform.as_str())
        .bind(state.expires_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Consume an outbound CSRF state record
    ///
    /// The row is always deleted, expired or not; expired records yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn consume_platform_state(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<PlatformOAuthState>> {
        let row = sqlx::query(
            r"
            DELETE FROM platform_oauth_states WHERE state = $1
            RETURNING state, user_id, platform, expires_at
            ",
        )
        .bind(state)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else { return Ok(None) };

        let platform: String = row.try_get("platform")?;
        let record = PlatformOAuthState {
            state: row.try_get("state")?,
            user_id: row.try_get("user_id")?,
            platform: Platform::from_str(&platform).map_err(AppError::database)?,
            expires_at: row.try_get("expires_at")?,
        };

        if record.expires_at <= now {
            return Ok(None);
        }

        Ok(Some(record))
    }
}
