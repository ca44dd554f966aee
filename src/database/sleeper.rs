// ABOUTME: Sleeper connection and league persistence queries
// ABOUTME: Upserts the public-identity linkage and discovered league rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{SleeperConnection, SleeperLeague, Sport};
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;

impl Database {
    /// Upsert the Sleeper identity linkage for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_sleeper_connection(&self, connection: &SleeperConnection) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO sleeper_connections (user_id, sleeper_user_id, sleeper_username, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                sleeper_user_id = EXCLUDED.sleeper_user_id,
                sleeper_username = EXCLUDED.sleeper_username,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(&connection.user_id)
        .bind(&connection.sleeper_user_id)
        .bind(&connection.sleeper_username)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch the stored Sleeper connection for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_sleeper_connection(
        &self,
        user_id: &str,
    ) -> AppResult<Option<SleeperConnection>> {
        let row = sqlx::query(
            r"
            SELECT user_id, sleeper_user_id, sleeper_username
            FROM sleeper_connections WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(|row| {
            Ok(SleeperConnection {
                user_id: row.try_get("user_id")?,
                sleeper_user_id: row.try_get("sleeper_user_id")?,
                sleeper_username: row.try_get("sleeper_username")?,
            })
        })
        .transpose()
    }

    /// Upsert one Sleeper league membership; returns true when the row was new
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_sleeper_league(&self, league: &SleeperLeague) -> AppResult<bool> {
        let row = sqlx::query(
            r"
            INSERT INTO sleeper_leagues
                (user_id, league_id, season_year, sport, league_name, roster_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, league_id, season_year) DO UPDATE SET
                sport = EXCLUDED.sport,
                league_name = COALESCE(EXCLUDED.league_name, sleeper_leagues.league_name),
                roster_id = COALESCE(EXCLUDED.roster_id, sleeper_leagues.roster_id)
            RETURNING (xmax = 0) AS inserted
            ",
        )
        .bind(&league.user_id)
        .bind(&league.league_id)
        .bind(league.season_year)
        .bind(league.sport.as_str())
        .bind(&league.league_name)
        .bind(league.roster_id)
        .fetch_one(self.pool())
        .await?;

        Ok(row.try_get("inserted")?)
    }

    /// List all Sleeper leagues held by a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_sleeper_leagues(&self, user_id: &str) -> AppResult<Vec<SleeperLeague>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, league_id, season_year, sport, league_name, roster_id
            FROM sleeper_leagues
            WHERE user_id = $1
            ORDER BY season_year DESC, league_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let sport: String = row.try_get("sport")?;
                Ok(SleeperLeague {
                    user_id: row.try_get("user_id")?,
                    league_id: row.try_get("league_id")?,
                    season_year: row.try_get("season_year")?,
                    sport: Sport::from_str(&sport).map_err(AppError::database)?,
                    league_name: row.try_get("league_name")?,
                    roster_id: row.try_get("roster_id")?,
                })
            })
            .collect()
    }

    /// Existence probe by the composite Sleeper league key
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn sleeper_league_exists(
        &self,
        user_id: &str,
        league_id: &str,
        season_year: i32,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            r"
            SELECT 1 AS present FROM sleeper_leagues
            WHERE user_id = $1 AND league_id = $2 AND season_year = $3
            ",
        )
        .bind(user_id)
        .bind(league_id)
        .bind(season_year)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.is_some())
    }
}
