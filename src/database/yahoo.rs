// ABOUTME: Yahoo credential and league persistence queries
// ABOUTME: Upserts OAuth token pairs and league memberships keyed per user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{Sport, YahooCredential, YahooLeague};
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::str::FromStr;

impl Database {
    /// Upsert the Yahoo token pair for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_yahoo_credentials(&self, credential: &YahooCredential) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO yahoo_credentials
                (user_id, access_token, refresh_token, expires_at, yahoo_guid, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at,
                yahoo_guid = COALESCE(EXCLUDED.yahoo_guid, yahoo_credentials.yahoo_guid),
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(&credential.user_id)
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.expires_at)
        .bind(&credential.yahoo_guid)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch the stored Yahoo credential row for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_yahoo_credentials(&self, user_id: &str) -> AppResult<Option<YahooCredential>> {
        let row = sqlx::query(
            r"
            SELECT user_id, access_token, refresh_token, expires_at, yahoo_guid
            FROM yahoo_credentials WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(|row| {
            Ok(YahooCredential {
                user_id: row.try_get("user_id")?,
                access_token: row.try_get("access_token")?,
                refresh_token: row.try_get("refresh_token")?,
                expires_at: row.try_get("expires_at")?,
                yahoo_guid: row.try_get("yahoo_guid")?,
            })
        })
        .transpose()
    }

    /// Store the result of a successful token refresh
    ///
    /// Only called after the upstream refresh succeeded; a failed refresh
    /// must never overwrite the stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn update_yahoo_tokens(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE yahoo_credentials SET
                access_token = $2,
                refresh_token = $3,
                expires_at = $4,
                updated_at = $5
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Delete a user's Yahoo credentials; returns true when a row was removed
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_yahoo_credentials(&self, user_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM yahoo_credentials WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Upsert one Yahoo league membership
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_yahoo_league(&self, league: &YahooLeague) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO yahoo_leagues
                (user_id, league_key, season_year, sport, league_name, team_key, team_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, league_key, season_year) DO UPDATE SET
                sport = EXCLUDED.sport,
                league_name = COALESCE(EXCLUDED.league_name, yahoo_leagues.league_name),
                team_key = COALESCE(EXCLUDED.team_key, yahoo_leagues.team_key),
                team_name = COALESCE(EXCLUDED.team_name, yahoo_leagues.team_name)
            ",
        )
        .bind(&league.user_id)
        .bind(&league.league_key)
        .bind(league.season_year)
        .bind(league.sport.as_str())
        .bind(&league.league_name)
        .bind(&league.team_key)
        .bind(&league.team_name)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// List all Yahoo leagues held by a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_yahoo_leagues(&self, user_id: &str) -> AppResult<Vec<YahooLeague>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, league_key, season_year, sport, league_name, team_key, team_name
            FROM yahoo_leagues
            WHERE user_id = $1
            ORDER BY season_year DESC, league_key
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let sport: String = row.try_get("sport")?;
                Ok(YahooLeague {
                    user_id: row.try_get("user_id")?,
                    league_key: row.try_get("league_key")?,
                    season_year: row.try_get("season_year")?,
                    sport: Sport::from_str(&sport).map_err(AppError::database)?,
                    league_name: row.try_get("league_name")?,
                    team_key: row.try_get("team_key")?,
                    team_name: row.try_get("team_name")?,
                })
            })
            .collect()
    }

    /// Existence probe by league key (any season)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn yahoo_league_exists(
        &self,
        user_id: &str,
        league_key: &str,
        season_year: i32,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            r"
            SELECT 1 AS present FROM yahoo_leagues
            WHERE user_id = $1 AND league_key = $2 AND season_year = $3
            ",
        )
        .bind(user_id)
        .bind(league_key)
        .bind(season_year)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.is_some())
    }

    /// Delete every season of one Yahoo league; returns true iff ≥1 row deleted
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_yahoo_league(&self, user_id: &str, league_key: &str) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM yahoo_leagues WHERE user_id = $1 AND league_key = $2")
                .bind(user_id)
                .bind(league_key)
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
