// ABOUTME: ESPN credential route handlers: setup status, raw reads, writes, deletion
// ABOUTME: Raw reads are rate-limited; writes validate cookies and trigger discovery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::{AppError, ErrorCode};
use crate::models::{is_valid_s2, is_valid_swid};
use crate::providers::espn::EspnError;
use crate::rate_limiting::RateLimitStatus;
use crate::resources::ServerResources;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query flags selecting the credential read shape
#[derive(Debug, Default, Deserialize)]
struct CredentialQuery {
    #[serde(default)]
    raw: Option<bool>,
    #[serde(rename = "forEdit", default)]
    for_edit: Option<bool>,
}

/// ESPN credential write body
#[derive(Debug, Deserialize)]
struct SaveCredentialsRequest {
    swid: String,
    s2: String,
    email: Option<String>,
}

/// ESPN credential routes
pub struct CredentialRoutes;

impl CredentialRoutes {
    /// Create all ESPN credential routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/credentials/espn", get(Self::handle_get))
            .route("/credentials/espn", post(Self::handle_save))
            .route("/credentials/espn", put(Self::handle_save))
            .route("/credentials/espn", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// GET /credentials/espn[?raw=true|?forEdit=true]
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<CredentialQuery>,
    ) -> Result<Response, AppError> {
        if query.raw == Some(true) {
            return Self::handle_get_raw(&resources, &headers).await;
        }
        if query.for_edit == Some(true) {
            return Self::handle_get_for_edit(&resources, &headers).await;
        }
        Self::handle_get_status(&resources, &headers).await
    }

    /// Metadata-only read: setup-status shape, never plaintext cookies
    async fn handle_get_status(
        resources: &Arc<ServerResources>,
        headers: &HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(headers).await?;

        let credential = resources.database.get_espn_credentials(&auth.user_id).await?;
        let has_credentials = credential
            .as_ref()
            .is_some_and(crate::models::EspnCredential::is_complete);

        let leagues = resources.database.get_espn_leagues(&auth.user_id).await?;
        let has_leagues = !leagues.is_empty();
        let has_default_team = leagues
            .iter()
            .any(|league| league.team_id.as_deref().is_some_and(|id| !id.is_empty()));

        Ok((
            StatusCode::OK,
            Json(json!({
                "hasCredentials": has_credentials,
                "hasLeagues": has_leagues,
                "hasDefaultTeam": has_default_team,
                "platform": "espn",
                "email": credential.as_ref().and_then(|c| c.email.clone()),
                "lastUpdated": credential.as_ref().map(|c| c.updated_at),
            })),
        )
            .into_response())
    }

    /// Raw read: the only path exposing plaintext swid/s2; rate-limited
    async fn handle_get_raw(
        resources: &Arc<ServerResources>,
        headers: &HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_any(headers).await?;

        let now = Utc::now();
        let status = resources
            .rate_limiter
            .check_and_increment(&auth.user_id, now)
            .await;

        if status.is_limited {
            let mut response = AppError::new(
                ErrorCode::RateLimitExceeded,
                "Rate limit exceeded for raw credential reads",
            )
            .into_response();
            apply_rate_limit_headers(&mut response, &status);
            if let Ok(value) = status.retry_after_seconds(now).to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
            return Ok(response);
        }

        let credential = resources
            .database
            .get_espn_credentials(&auth.user_id)
            .await?
            .filter(crate::models::EspnCredential::is_complete)
            .ok_or_else(|| AppError::not_found("ESPN credentials"))?;

        let mut response = (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "platform": "espn",
                "credentials": {
                    "swid": credential.swid,
                    "s2": credential.s2,
                },
            })),
        )
            .into_response();
        apply_rate_limit_headers(&mut response, &status);
        Ok(response)
    }

    /// Edit read: plaintext pair for the owner's settings form
    async fn handle_get_for_edit(
        resources: &Arc<ServerResources>,
        headers: &HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(headers).await?;

        let credential = resources
            .database
            .get_espn_credentials(&auth.user_id)
            .await?
            .filter(crate::models::EspnCredential::is_complete)
            .ok_or_else(|| AppError::not_found("ESPN credentials"))?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "hasCredentials": true,
                "swid": credential.swid,
                "s2": credential.s2,
            })),
        )
            .into_response())
    }

    /// POST|PUT /credentials/espn: validate, upsert, run automatic discovery
    async fn handle_save(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SaveCredentialsRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let swid = request.swid.trim().to_owned();
        if !is_valid_swid(&swid) {
            return Err(AppError::invalid_input("Invalid SWID format"));
        }
        if !is_valid_s2(request.s2.trim()) {
            return Err(AppError::invalid_input("Invalid espn_s2 format"));
        }

        resources
            .database
            .upsert_espn_credentials(
                &auth.user_id,
                &swid,
                request.s2.trim(),
                request.email.as_deref(),
            )
            .await?;

        // Automatic discovery: a credential save immediately enumerates
        // leagues. "No leagues" is a success with zeroed counts; a cookie
        // rejection surfaces as an authentication failure.
        let engine = resources.discovery_engine();
        match engine.run(&auth.user_id, &swid, request.s2.trim()).await {
            Ok(result) => Ok((
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "platform": "espn",
                    "discovery": result,
                })),
            )
                .into_response()),
            Err(EspnError::NoLeaguesFound) => Ok((
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "platform": "espn",
                    "discovery": crate::discovery::DiscoveryResult::default(),
                })),
            )
                .into_response()),
            Err(e @ EspnError::AuthenticationFailed(_)) => Err(e.into()),
            Err(e) => {
                tracing::warn!(user_id = %auth.user_id, "Discovery failed after save: {e}");
                Ok((
                    StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "platform": "espn",
                        "discoveryError": e.to_string(),
                    })),
                )
                    .into_response())
            }
        }
    }

    /// DELETE /credentials/espn: credentials and leagues together
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let deleted = resources
            .database
            .delete_espn_credentials(&auth.user_id)
            .await?;

        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "deleted": deleted })),
        )
            .into_response())
    }
}

fn apply_rate_limit_headers(response: &mut Response, status: &RateLimitStatus) {
    let headers = response.headers_mut();
    if let Ok(value) = status.limit.to_string().parse() {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = status.remaining.to_string().parse() {
        headers.insert("X-RateLimit-Remaining", value);
    }
    if let Ok(value) = status.reset_at.timestamp().to_string().parse() {
        headers.insert("X-RateLimit-Reset", value);
    }
}
