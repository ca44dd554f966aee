// ABOUTME: OAuth 2.1 persistence: clients, authorization codes, tokens, and CSRF state
// ABOUTME: Single-use records are consumed through conditional statements for linearizability
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{OAuthCode, OAuthState, OAuthToken};
use chrono::{DateTime, Utc};
use sqlx::Row;

fn row_to_token(row: &sqlx::postgres::PgRow) -> AppResult<OAuthToken> {
    Ok(OAuthToken {
        access_token: row.try_get("access_token")?,
        user_id: row.try_get("user_id")?,
        scope: row.try_get("scope")?,
        resource: row.try_get("resource")?,
        client_name: row.try_get("client_name")?,
        expires_at: row.try_get("expires_at")?,
        revoked_at: row.try_get("revoked_at")?,
        refresh_token: row.try_get("refresh_token")?,
        refresh_token_expires_at: row.try_get("refresh_token_expires_at")?,
        created_at: row.try_get("created_at")?,
    })
}

impl Database {
    /// Store a dynamically registered client
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn store_oauth_client(
        &self,
        client_id: &str,
        client_name: Option<&str>,
        redirect_uris: &[String],
    ) -> AppResult<()> {
        let uris = serde_json::to_string(redirect_uris)
            .map_err(|e| AppError::internal(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO oauth_clients (client_id, client_name, redirect_uris, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(client_id)
        .bind(client_name)
        .bind(uris)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Store a freshly minted authorization code
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn store_oauth_code(&self, code: &OAuthCode) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO oauth_codes
                (code, user_id, redirect_uri, scope, resource, state,
                 code_challenge, code_challenge_method, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(&code.code)
        .bind(&code.user_id)
        .bind(&code.redirect_uri)
        .bind(&code.scope)
        .bind(&code.resource)
        .bind(&code.state)
        .bind(&code.code_challenge)
        .bind(&code.code_challenge_method)
        .bind(code.expires_at)
        .bind(code.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Atomically consume an authorization code
    ///
    /// The conditional UPDATE marks `used_at` only when the code is unused,
    /// unexpired, and bound to the presented `redirect_uri`, so at most one
    /// exchange can ever succeed for a given code. `None` means the code was
    /// not found, already used, expired, or bound to a different redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn consume_oauth_code(
        &self,
        code: &str,
        redirect_uri: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<OAuthCode>> {
        let row = sqlx::query(
            r"
            UPDATE oauth_codes SET used_at = $3
            WHERE code = $1 AND redirect_uri = $2 AND used_at IS NULL AND expires_at > $3
            RETURNING code, user_id, redirect_uri, scope, resource, state,
                      code_challenge, code_challenge_method, expires_at, used_at, created_at
            ",
        )
        .bind(code)
        .bind(redirect_uri)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;

        row.map(|row| {
            Ok(OAuthCode {
                code: row.try_get("code")?,
                user_id: row.try_get("user_id")?,
                redirect_uri: row.try_get("redirect_uri")?,
                scope: row.try_get("scope")?,
                resource: row.try_get("resource")?,
                state: row.try_get("state")?,
                code_challenge: row.try_get("code_challenge")?,
                code_challenge_method: row.try_get("code_challenge_method")?,
                expires_at: row.try_get("expires_at")?,
                used_at: row.try_get("used_at")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    /// Store a freshly minted access token (with attached refresh token)
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn store_oauth_token(&self, token: &OAuthToken) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO oauth_tokens
                (access_token, user_id, scope, resource, client_name, expires_at,
                 refresh_token, refresh_token_expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&token.access_token)
        .bind(&token.user_id)
        .bind(&token.scope)
        .bind(&token.resource)
        .bind(&token.client_name)
        .bind(token.expires_at)
        .bind(&token.refresh_token)
        .bind(token.refresh_token_expires_at)
        .bind(token.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Look up a token row by access-token value
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_oauth_token(&self, access_token: &str) -> AppResult<Option<OAuthToken>> {
        let row = sqlx::query("SELECT * FROM oauth_tokens WHERE access_token = $1")
            .bind(access_token)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(row_to_token).transpose()
    }

    /// Look up a token row by refresh-token value
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_oauth_token_by_refresh(
        &self,
        refresh_token: &str,
    ) -> AppResult<Option<OAuthToken>> {
        let row = sqlx::query("SELECT * FROM oauth_tokens WHERE refresh_token = $1")
            .bind(refresh_token)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(row_to_token).transpose()
    }

    /// Revoke a token by access-token value
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn revoke_oauth_token(&self, access_token: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE oauth_tokens SET revoked_at = $2 WHERE access_token = $1 AND revoked_at IS NULL",
        )
        .bind(access_token)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Revoke whichever token row matches the presented value (access or refresh)
    ///
    /// Unknown values are a no-op; RFC 7009 requires revocation to succeed
    /// visibly either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn revoke_oauth_token_by_value(&self, token: &str) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE oauth_tokens SET revoked_at = $2
            WHERE (access_token = $1 OR refresh_token = $1) AND revoked_at IS NULL
            ",
        )
        .bind(token)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Revoke every token held by a user; returns the number of rows revoked
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn revoke_all_oauth_tokens(&self, user_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE oauth_tokens SET revoked_at = $2 WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// List a user's active (unrevoked, unexpired) tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active_oauth_tokens(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<OAuthToken>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM oauth_tokens
            WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_to_token).collect()
    }

    /// Store an inbound CSRF state record
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn store_oauth_state(&self, state: &OAuthState) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO oauth_states (state, user_id, client_id, redirect_uri, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (state) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                client_id = EXCLUDED.client_id,
                redirect_uri = EXCLUDED.redirect_uri,
                expires_at = EXCLUDED.expires_at
            ",
        )
        .bind(&state.state)
        .bind(&state.user_id)
        .bind(&state.client_id)
        .bind(&state.redirect_uri)
        .bind(state.expires_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Consume an inbound CSRF state record
    ///
    /// The row is always deleted, expired or not; expired records yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn consume_oauth_state(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<OAuthState>> {
        let row = sqlx::query(
            r"
            DELETE FROM oauth_states WHERE state = $1
            RETURNING state, user_id, client_id, redirect_uri, expires_at
            ",
        )
        .bind(state)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else { return Ok(None) };

        let record = OAuthState {
            state: row.try_get("state")?,
            user_id: row.try_get("user_id")?,
            client_id: row.try_get("client_id")?,
            redirect_uri: row.try_get("redirect_uri")?,
            expires_at: row.try_get("expires_at")?,
        };

        if record.expires_at <= now {
            return Ok(None);
        }

        Ok(Some(record))
    }
}
