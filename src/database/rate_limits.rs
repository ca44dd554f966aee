// ABOUTME: Daily per-user rate-limit counter queries
// ABOUTME: Increments happen server-side through the increment_rate_limit function
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::Database;
use crate::errors::AppResult;
use chrono::NaiveDate;
use sqlx::Row;

impl Database {
    /// Atomically increment the user's counter for the window and return the new count
    ///
    /// The increment is a single server-side upsert, so it stays correct
    /// under concurrent requests and horizontal scaling.
    ///
    /// # Errors
    ///
    /// Returns an error if the function call fails.
    pub async fn increment_rate_limit(
        &self,
        user_id: &str,
        window_date: NaiveDate,
    ) -> AppResult<i32> {
        let row = sqlx::query("SELECT increment_rate_limit($1, $2) AS request_count")
            .bind(user_id)
            .bind(window_date)
            .fetch_one(self.pool())
            .await?;

        Ok(row.try_get("request_count")?)
    }

    /// Read the current count for the window without incrementing
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_rate_limit_count(
        &self,
        user_id: &str,
        window_date: NaiveDate,
    ) -> AppResult<i32> {
        let row = sqlx::query(
            "SELECT request_count FROM rate_limits WHERE user_id = $1 AND window_date = $2",
        )
        .bind(user_id)
        .bind(window_date)
        .fetch_optional(self.pool())
        .await?;

        row.map_or(Ok(0), |row| Ok(row.try_get("request_count")?))
    }
}
