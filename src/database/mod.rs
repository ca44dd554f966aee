// ABOUTME: PostgreSQL database handle, schema migrations, and shared pool management
// ABOUTME: Per-domain query implementations live in the sibling modules of this directory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Database layer
//!
//! A single [`Database`] wraps the connection pool; domain-specific queries
//! are implemented in per-domain modules (`espn`, `yahoo`, `sleeper`,
//! `preferences`, `oauth`, `platform_states`, `rate_limits`). All writes to
//! credential and preference tables are upserts keyed on their documented
//! conflict keys; single-use records (codes, states) are consumed through
//! conditional statements so consumption is linearizable.

mod espn;
mod oauth;
mod platform_states;
mod preferences;
mod rate_limits;
mod sleeper;
mod yahoo;

use crate::errors::AppResult;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::time::Duration;

/// PostgreSQL database handle
#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Connect to the database and build the pool
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests and embedding callers)
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run idempotent schema migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails or the connection is lost.
    pub async fn migrate(&self) -> AppResult<()> {
        self.create_credential_tables().await?;
        self.create_league_tables().await?;
        self.create_preference_table().await?;
        self.create_oauth_tables().await?;
        self.create_rate_limit_objects().await?;
        self.create_indexes().await?;
        Ok(())
    }

    async fn create_credential_tables(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS espn_credentials (
                user_id TEXT PRIMARY KEY,
                swid TEXT NOT NULL,
                s2 TEXT NOT NULL,
                email TEXT,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS yahoo_credentials (
                user_id TEXT PRIMARY KEY,
                access_token TEXT NOT NULL,
                refresh_token TEXT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                yahoo_guid TEXT,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sleeper_connections (
                user_id TEXT PRIMARY KEY,
                sleeper_user_id TEXT NOT NULL,
                sleeper_username TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_league_tables(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS espn_leagues (
                user_id TEXT NOT NULL,
                sport TEXT NOT NULL,
                league_id TEXT NOT NULL,
                season_year INTEGER NOT NULL,
                team_id TEXT,
                team_name TEXT,
                league_name TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (user_id, sport, league_id, season_year)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS yahoo_leagues (
                user_id TEXT NOT NULL,
                league_key TEXT NOT NULL,
                season_year INTEGER NOT NULL,
                sport TEXT NOT NULL,
                league_name TEXT,
                team_key TEXT,
                team_name TEXT,
                PRIMARY KEY (user_id, league_key, season_year)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sleeper_leagues (
                user_id TEXT NOT NULL,
                league_id TEXT NOT NULL,
                season_year INTEGER NOT NULL,
                sport TEXT NOT NULL,
                league_name TEXT,
                roster_id BIGINT,
                PRIMARY KEY (user_id, league_id, season_year)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_preference_table(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_preferences (
                user_id TEXT PRIMARY KEY,
                default_sport TEXT,
                default_football TEXT,
                default_baseball TEXT,
                default_basketball TEXT,
                default_hockey TEXT,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_oauth_tables(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_clients (
                client_id TEXT PRIMARY KEY,
                client_name TEXT,
                redirect_uris TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_codes (
                code TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                redirect_uri TEXT NOT NULL,
                scope TEXT NOT NULL,
                resource TEXT,
                state TEXT,
                code_challenge TEXT,
                code_challenge_method TEXT,
                expires_at TIMESTAMPTZ NOT NULL,
                used_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_tokens (
                access_token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                scope TEXT NOT NULL,
                resource TEXT,
                client_name TEXT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                revoked_at TIMESTAMPTZ,
                refresh_token TEXT,
                refresh_token_expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_states (
                state TEXT PRIMARY KEY,
                user_id TEXT,
                client_id TEXT,
                redirect_uri TEXT,
                expires_at TIMESTAMPTZ NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS platform_oauth_states (
                state TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_rate_limit_objects(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS rate_limits (
                user_id TEXT NOT NULL,
                window_date DATE NOT NULL,
                request_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, window_date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Server-side atomic increment; callers read the post-increment count
        sqlx::query(
            r"
            CREATE OR REPLACE FUNCTION increment_rate_limit(p_user_id TEXT, p_window_date DATE)
            RETURNS INTEGER AS $$
                INSERT INTO rate_limits (user_id, window_date, request_count)
                VALUES (p_user_id, p_window_date, 1)
                ON CONFLICT (user_id, window_date)
                DO UPDATE SET request_count = rate_limits.request_count + 1
                RETURNING request_count
            $$ LANGUAGE sql
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_indexes(&self) -> AppResult<()> {
        let statements = [
            "CREATE INDEX IF NOT EXISTS idx_espn_leagues_user ON espn_leagues (user_id)",
            "CREATE INDEX IF NOT EXISTS idx_yahoo_leagues_user ON yahoo_leagues (user_id)",
            "CREATE INDEX IF NOT EXISTS idx_sleeper_leagues_user ON sleeper_leagues (user_id)",
            "CREATE INDEX IF NOT EXISTS idx_oauth_tokens_user ON oauth_tokens (user_id)",
            "CREATE INDEX IF NOT EXISTS idx_oauth_tokens_refresh ON oauth_tokens (refresh_token)",
            "CREATE INDEX IF NOT EXISTS idx_oauth_codes_user ON oauth_codes (user_id)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }
}
