// ABOUTME: User preference routes for default sport and per-sport default leagues
// ABOUTME: Reads aggregate the preference row; writes validate sport names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::{AppError, ErrorCode};
use crate::models::Sport;
use crate::resources::ServerResources;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

/// Body for POST /user/preferences/default-sport
#[derive(Debug, Deserialize)]
struct DefaultSportRequest {
    /// A sport name, or null to clear
    sport: Option<String>,
}

/// Preference routes
pub struct PreferenceRoutes;

impl PreferenceRoutes {
    /// Create all preference routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/user/preferences", get(Self::handle_get))
            .route(
                "/user/preferences/default-sport",
                post(Self::handle_set_default_sport),
            )
            .with_state(resources)
    }

    /// GET /user/preferences (IdP or eval)
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_any(&headers).await?;

        let preferences = resources.database.get_preferences(&auth.user_id).await?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "defaultSport": preferences.default_sport,
                "defaultFootball": preferences.default_football,
                "defaultBaseball": preferences.default_baseball,
                "defaultBasketball": preferences.default_basketball,
                "defaultHockey": preferences.default_hockey,
            })),
        )
            .into_response())
    }

    /// POST /user/preferences/default-sport
    async fn handle_set_default_sport(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<DefaultSportRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let sport = request
            .sport
            .as_deref()
            .map(|raw| {
                Sport::from_str(raw).map_err(|_| {
                    AppError::new(ErrorCode::InvalidSport, format!("invalid_sport: {raw}"))
                })
            })
            .transpose()?;

        resources
            .database
            .set_default_sport(&auth.user_id, sport)
            .await?;

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }
}
