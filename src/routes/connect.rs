// ABOUTME: Platform connector routes: Yahoo OAuth flow and Sleeper username discovery
// ABOUTME: Browser-facing steps redirect to the frontend; API steps return JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::oauth2::redirect_found;
use crate::errors::AppError;
use crate::models::{Platform, PlatformOAuthState, YahooCredential};
use crate::resources::ServerResources;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Outbound CSRF state lifetime
const PLATFORM_STATE_TTL_MINUTES: i64 = 10;

/// Yahoo callback query parameters
#[derive(Debug, Default, Deserialize)]
struct YahooCallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Sleeper discovery body
#[derive(Debug, Deserialize)]
struct SleeperDiscoverRequest {
    username: String,
}

/// Platform connector routes
pub struct ConnectRoutes;

impl ConnectRoutes {
    /// Create all connector routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/connect/yahoo/authorize", get(Self::handle_yahoo_authorize))
            .route("/connect/yahoo/callback", get(Self::handle_yahoo_callback))
            .route(
                "/connect/yahoo/credentials",
                get(Self::handle_yahoo_credentials),
            )
            .route("/connect/yahoo/status", get(Self::handle_yahoo_status))
            .route(
                "/connect/yahoo/disconnect",
                delete(Self::handle_yahoo_disconnect),
            )
            .route("/connect/yahoo/discover", post(Self::handle_yahoo_discover))
            .route(
                "/connect/sleeper/discover",
                post(Self::handle_sleeper_discover),
            )
            .with_state(resources)
    }

    fn frontend_error(resources: &ServerResources, kind: &str) -> Response {
        redirect_found(&format!(
            "{}/leagues?error={}",
            resources.config.frontend_url,
            urlencoding::encode(kind)
        ))
    }

    /// GET /connect/yahoo/authorize (IdP): 302 to Yahoo with stored CSRF state
    async fn handle_yahoo_authorize(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;
        let manager = resources.yahoo_manager().map_err(AppError::from)?;

        let state = format!("{}:{}", auth.user_id, Uuid::new_v4());
        resources
            .database
            .store_platform_state(&PlatformOAuthState {
                state: state.clone(),
                user_id: auth.user_id.clone(),
                platform: Platform::Yahoo,
                expires_at: Utc::now() + Duration::minutes(PLATFORM_STATE_TTL_MINUTES),
            })
            .await?;

        Ok(redirect_found(&manager.oauth().authorize_url(&state)))
    }

    /// GET /connect/yahoo/callback (public): completes the outbound flow
    ///
    /// Every failure redirects to the frontend with `?error=<kind>`; only a
    /// completed exchange lands on `?yahoo=connected`.
    async fn handle_yahoo_callback(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<YahooCallbackQuery>,
    ) -> Response {
        if let Some(error) = query.error {
            tracing::warn!(error = %error, "Yahoo authorization was denied");
            return Self::frontend_error(&resources, "access_denied");
        }

        let (Some(code), Some(state)) = (query.code, query.state) else {
            return Self::frontend_error(&resources, "missing_params");
        };

        let record = match resources
            .database
            .consume_platform_state(&state, Utc::now())
            .await
        {
            Ok(Some(record)) if record.platform == Platform::Yahoo => record,
            Ok(_) => return Self::frontend_error(&resources, "invalid_state"),
            Err(e) => {
                tracing::error!("Platform state lookup failed: {e}");
                return Self::frontend_error(&resources, "invalid_state");
            }
        };

        let manager = match resources.yahoo_manager() {
            Ok(manager) => manager,
            Err(e) => return Self::frontend_error(&resources, e.redirect_kind()),
        };

        let tokens = match manager.oauth().exchange_code(&code).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(user_id = %record.user_id, "Yahoo token exchange failed: {e}");
                return Self::frontend_error(&resources, e.redirect_kind());
            }
        };

        let credential = YahooCredential {
            user_id: record.user_id.clone(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            yahoo_guid: tokens.yahoo_guid,
        };
        if let Err(e) = resources.database.upsert_yahoo_credentials(&credential).await {
            tracing::error!(user_id = %record.user_id, "Failed to store Yahoo tokens: {e}");
            return Self::frontend_error(&resources, "storage_failed");
        }

        tracing::info!(user_id = %record.user_id, "Yahoo connected");
        redirect_found(&format!(
            "{}/leagues?yahoo=connected",
            resources.config.frontend_url
        ))
    }

    /// GET /connect/yahoo/credentials (IdP or eval): transparently refreshed token
    async fn handle_yahoo_credentials(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_any(&headers).await?;
        let manager = resources.yahoo_manager().map_err(AppError::from)?;

        let credential = manager.get_valid_credentials(&auth.user_id).await?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "access_token": credential.access_token,
                "expires_in": credential.expires_in(Utc::now()),
            })),
        )
            .into_response())
    }

    /// GET /connect/yahoo/status (IdP)
    async fn handle_yahoo_status(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let credential = resources.database.get_yahoo_credentials(&auth.user_id).await?;
        let body = credential.map_or_else(
            || json!({ "connected": false }),
            |credential| {
                json!({
                    "connected": true,
                    "expiresAt": credential.expires_at,
                    "needsRefresh": credential.needs_refresh(Utc::now()),
                })
            },
        );

        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// DELETE /connect/yahoo/disconnect (IdP)
    async fn handle_yahoo_disconnect(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let deleted = resources
            .database
            .delete_yahoo_credentials(&auth.user_id)
            .await?;

        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "disconnected": deleted })),
        )
            .into_response())
    }

    /// POST /connect/yahoo/discover (IdP): enumerate and save leagues
    async fn handle_yahoo_discover(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;
        let manager = resources.yahoo_manager().map_err(AppError::from)?;

        let leagues = manager.discover_leagues(&auth.user_id).await?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "leagues_found": leagues.len(),
            })),
        )
            .into_response())
    }

    /// POST /connect/sleeper/discover (IdP): link username and discover
    async fn handle_sleeper_discover(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SleeperDiscoverRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let username = request.username.trim();
        if username.is_empty() {
            return Err(AppError::invalid_input("username is required"));
        }

        let connector = resources.sleeper_connector();
        let result = connector.discover(&auth.user_id, username, Utc::now()).await?;

        Ok((StatusCode::OK, Json(result)).into_response())
    }
}
