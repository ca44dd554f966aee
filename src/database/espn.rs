// ABOUTME: ESPN credential and league persistence queries
// ABOUTME: Upserts the per-user cookie pair and manages the capped league set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{EspnCredential, EspnLeague, Sport, MAX_LEAGUES_PER_USER};
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;

fn row_to_league(row: &sqlx::postgres::PgRow) -> AppResult<EspnLeague> {
    let sport: String = row.try_get("sport")?;
    Ok(EspnLeague {
        user_id: row.try_get("user_id")?,
        sport: Sport::from_str(&sport).map_err(AppError::database)?,
        league_id: row.try_get("league_id")?,
        season_year: row.try_get("season_year")?,
        team_id: row.try_get("team_id")?,
        team_name: row.try_get("team_name")?,
        league_name: row.try_get("league_name")?,
    })
}

impl Database {
    /// Upsert the ESPN cookie pair for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_espn_credentials(
        &self,
        user_id: &str,
        swid: &str,
        s2: &str,
        email: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO espn_credentials (user_id, swid, s2, email, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                swid = EXCLUDED.swid,
                s2 = EXCLUDED.s2,
                email = COALESCE(EXCLUDED.email, espn_credentials.email),
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(user_id)
        .bind(swid)
        .bind(s2)
        .bind(email)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch the stored ESPN credential row for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_espn_credentials(&self, user_id: &str) -> AppResult<Option<EspnCredential>> {
        let row = sqlx::query(
            "SELECT user_id, swid, s2, email, updated_at FROM espn_credentials WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(|row| {
            Ok(EspnCredential {
                user_id: row.try_get("user_id")?,
                swid: row.try_get("swid")?,
                s2: row.try_get("s2")?,
                email: row.try_get("email")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    /// Delete a user's ESPN credentials and all their ESPN leagues
    ///
    /// Both deletions are attempted; a failure in either surfaces to the
    /// caller. Returns true when a credential row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if either delete fails.
    pub async fn delete_espn_credentials(&self, user_id: &str) -> AppResult<bool> {
        let credentials = sqlx::query("DELETE FROM espn_credentials WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        sqlx::query("DELETE FROM espn_leagues WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(credentials.rows_affected() > 0)
    }

    /// Existence probe by the composite league key
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn espn_league_exists(
        &self,
        user_id: &str,
        sport: Sport,
        league_id: &str,
        season_year: i32,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            r"
            SELECT 1 AS present FROM espn_leagues
            WHERE user_id = $1 AND sport = $2 AND league_id = $3 AND season_year = $4
            ",
        )
        .bind(user_id)
        .bind(sport.as_str())
        .bind(league_id)
        .bind(season_year)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.is_some())
    }

    /// Whether the league row has a team bound
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn espn_league_has_team(
        &self,
        user_id: &str,
        sport: Sport,
        league_id: &str,
        season_year: i32,
    ) -> AppResult<bool> {
        let row = sqlx::query(
            r"
            SELECT team_id FROM espn_leagues
            WHERE user_id = $1 AND sport = $2 AND league_id = $3 AND season_year = $4
            ",
        )
        .bind(user_id)
        .bind(sport.as_str())
        .bind(league_id)
        .bind(season_year)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else { return Ok(false) };
        let team_id: Option<String> = row.try_get("team_id")?;
        Ok(team_id.is_some_and(|id| !id.is_empty()))
    }

    /// Count all (league, season) rows held by a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_espn_leagues(&self, user_id: &str) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM espn_leagues WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await?;

        Ok(row.try_get("total")?)
    }

    /// Insert a single league row, enforcing the per-user cap
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` when the user already holds the maximum number
    /// of leagues, `DuplicateResource` when the row already exists, or a
    /// database error otherwise.
    pub async fn insert_espn_league(&self, league: &EspnLeague) -> AppResult<()> {
        if self
            .espn_league_exists(
                &league.user_id,
                league.sport,
                &league.league_id,
                league.season_year,
            )
            .await?
        {
            return Err(AppError::new(
                ErrorCode::DuplicateResource,
                "League already saved for this season",
            ));
        }

        let count = self.count_espn_leagues(&league.user_id).await?;
        if count >= MAX_LEAGUES_PER_USER as i64 {
            return Err(AppError::new(
                ErrorCode::LimitExceeded,
                format!("League limit of {MAX_LEAGUES_PER_USER} reached"),
            ));
        }

        sqlx::query(
            r"
            INSERT INTO espn_leagues
                (user_id, sport, league_id, season_year, team_id, team_name, league_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&league.user_id)
        .bind(league.sport.as_str())
        .bind(&league.league_id)
        .bind(league.season_year)
        .bind(&league.team_id)
        .bind(&league.team_name)
        .bind(&league.league_name)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// List all ESPN leagues held by a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_espn_leagues(&self, user_id: &str) -> AppResult<Vec<EspnLeague>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, sport, league_id, season_year, team_id, team_name, league_name
            FROM espn_leagues
            WHERE user_id = $1
            ORDER BY sport, league_id, season_year DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_to_league).collect()
    }

    /// Delete every season of one (league, sport) tuple
    ///
    /// Returns true iff at least one row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn remove_espn_league(
        &self,
        user_id: &str,
        league_id: &str,
        sport: Sport,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM espn_leagues WHERE user_id = $1 AND league_id = $2 AND sport = $3",
        )
        .bind(user_id)
        .bind(league_id)
        .bind(sport.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Bulk replace a user's league set (delete-then-insert in one transaction)
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` when more than the maximum number of leagues
    /// is supplied, or a database error if the transaction fails.
    pub async fn set_espn_leagues(&self, user_id: &str, leagues: &[EspnLeague]) -> AppResult<()> {
        if leagues.len() > MAX_LEAGUES_PER_USER {
            return Err(AppError::new(
                ErrorCode::LimitExceeded,
                format!("League limit of {MAX_LEAGUES_PER_USER} exceeded"),
            ));
        }

        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM espn_leagues WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for league in leagues {
            sqlx::query(
                r"
                INSERT INTO espn_leagues
                    (user_id, sport, league_id, season_year, team_id, team_name, league_name)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (user_id, sport, league_id, season_year) DO UPDATE SET
                    team_id = EXCLUDED.team_id,
                    team_name = EXCLUDED.team_name,
                    league_name = EXCLUDED.league_name
                ",
            )
            .bind(user_id)
            .bind(league.sport.as_str())
            .bind(&league.league_id)
            .bind(league.season_year)
            .bind(&league.team_id)
            .bind(&league.team_name)
            .bind(&league.league_name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Bind or update the user's team on matching league rows
    ///
    /// `sport` and `season_year` narrow the update when supplied; otherwise
    /// every season of the league is updated. Returns true iff at least one
    /// row changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_espn_league_team(
        &self,
        user_id: &str,
        league_id: &str,
        team_id: &str,
        sport: Option<Sport>,
        season_year: Option<i32>,
        team_name: Option<&str>,
        league_name: Option<&str>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE espn_leagues SET
                team_id = $3,
                team_name = COALESCE($4, team_name),
                league_name = COALESCE($5, league_name)
            WHERE user_id = $1 AND league_id = $2
              AND ($6::TEXT IS NULL OR sport = $6)
              AND ($7::INTEGER IS NULL OR season_year = $7)
            ",
        )
        .bind(user_id)
        .bind(league_id)
        .bind(team_id)
        .bind(team_name)
        .bind(league_name)
        .bind(sport.map(Sport::as_str))
        .bind(season_year)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
