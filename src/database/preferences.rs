// ABOUTME: User preference persistence queries for default sport and per-sport default leagues
// ABOUTME: Stores league defaults as JSON text columns keyed by sport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{LeagueDefault, Sport, UserPreferences};
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;

const fn default_column(sport: Sport) -> &'static str {
    match sport {
        Sport::Football => "default_football",
        Sport::Baseball => "default_baseball",
        Sport::Basketball => "default_basketball",
        Sport::Hockey => "default_hockey",
    }
}

fn parse_default(raw: Option<String>) -> AppResult<Option<LeagueDefault>> {
    raw.map(|json| serde_json::from_str(&json).map_err(|e| AppError::database(e.to_string())))
        .transpose()
}

impl Database {
    /// Fetch the preference record for a user, defaulting to empty
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored default cannot be parsed.
    pub async fn get_preferences(&self, user_id: &str) -> AppResult<UserPreferences> {
        let row = sqlx::query(
            r"
            SELECT default_sport, default_football, default_baseball,
                   default_basketball, default_hockey
            FROM user_preferences WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(UserPreferences::default());
        };

        let default_sport: Option<String> = row.try_get("default_sport")?;
        let default_sport = default_sport
            .map(|s| Sport::from_str(&s).map_err(AppError::database))
            .transpose()?;

        Ok(UserPreferences {
            default_sport,
            default_football: parse_default(row.try_get("default_football")?)?,
            default_baseball: parse_default(row.try_get("default_baseball")?)?,
            default_basketball: parse_default(row.try_get("default_basketball")?)?,
            default_hockey: parse_default(row.try_get("default_hockey")?)?,
        })
    }

    /// Upsert the preferred sport (or clear it with `None`)
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn set_default_sport(&self, user_id: &str, sport: Option<Sport>) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO user_preferences (user_id, default_sport, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                default_sport = EXCLUDED.default_sport,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(user_id)
        .bind(sport.map(Sport::as_str))
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Upsert the default league for one sport (or clear it with `None`)
    ///
    /// Referential validation (league existence, team binding) happens at the
    /// route layer; this only writes the column.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn set_default_league(
        &self,
        user_id: &str,
        sport: Sport,
        league_default: Option<&LeagueDefault>,
    ) -> AppResult<()> {
        let json = league_default
            .map(|d| serde_json::to_string(d).map_err(|e| AppError::internal(e.to_string())))
            .transpose()?;

        let column = default_column(sport);
        let sql = format!(
            r"
            INSERT INTO user_preferences (user_id, {column}, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                {column} = EXCLUDED.{column},
                updated_at = EXCLUDED.updated_at
            "
        );

        sqlx::query(&sql)
            .bind(user_id)
            .bind(json)
            .bind(Utc::now())
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
