// ABOUTME: League route handlers for listing, bulk replace, single add, defaults, and team binding
// ABOUTME: Covers ESPN league management plus Yahoo league listing and removal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::{AppError, ErrorCode};
use crate::models::{EspnLeague, LeagueDefault, Platform, Sport};
use crate::resources::ServerResources;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

/// One league entry in write requests
#[derive(Debug, Deserialize)]
struct LeagueEntry {
    sport: String,
    #[serde(rename = "leagueId")]
    league_id: String,
    #[serde(rename = "seasonYear")]
    season_year: i32,
    #[serde(rename = "teamId")]
    team_id: Option<String>,
    #[serde(rename = "teamName")]
    team_name: Option<String>,
    #[serde(rename = "leagueName")]
    league_name: Option<String>,
}

impl LeagueEntry {
    fn into_model(self, user_id: &str) -> Result<EspnLeague, AppError> {
        let sport = parse_sport(&self.sport)?;
        Ok(EspnLeague {
            user_id: user_id.to_owned(),
            sport,
            league_id: self.league_id,
            season_year: self.season_year,
            team_id: self.team_id,
            team_name: self.team_name,
            league_name: self.league_name,
        })
    }
}

/// Bulk replace body
#[derive(Debug, Deserialize)]
struct SetLeaguesRequest {
    leagues: Vec<LeagueEntry>,
}

/// Query for DELETE /leagues
#[derive(Debug, Deserialize)]
struct RemoveLeagueQuery {
    #[serde(rename = "leagueId")]
    league_id: String,
    sport: String,
}

/// Body for POST /leagues/default
#[derive(Debug, Deserialize)]
struct SetDefaultRequest {
    platform: String,
    #[serde(rename = "leagueId")]
    league_id: String,
    sport: String,
    #[serde(rename = "seasonYear")]
    season_year: i32,
}

/// Body for PATCH /leagues/:leagueId/team
#[derive(Debug, Deserialize)]
struct BindTeamRequest {
    #[serde(rename = "teamId")]
    team_id: String,
    sport: Option<String>,
    #[serde(rename = "teamName")]
    team_name: Option<String>,
    #[serde(rename = "leagueName")]
    league_name: Option<String>,
    #[serde(rename = "seasonYear")]
    season_year: Option<i32>,
}

fn parse_sport(raw: &str) -> Result<Sport, AppError> {
    Sport::from_str(raw)
        .map_err(|_| AppError::new(ErrorCode::InvalidSport, format!("invalid_sport: {raw}")))
}

/// League routes
pub struct LeagueRoutes;

impl LeagueRoutes {
    /// Create all league routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/leagues", get(Self::handle_list))
            .route("/leagues", post(Self::handle_set))
            .route("/leagues", put(Self::handle_set))
            .route("/leagues", delete(Self::handle_remove))
            .route("/leagues/add", post(Self::handle_add))
            .route("/leagues/default", post(Self::handle_set_default))
            .route("/leagues/default/:sport", delete(Self::handle_clear_default))
            .route("/leagues/:league_id/team", patch(Self::handle_bind_team))
            .route("/leagues/yahoo", get(Self::handle_list_yahoo))
            .route("/leagues/yahoo/:id", delete(Self::handle_remove_yahoo))
            .with_state(resources)
    }

    /// GET /leagues (IdP or eval)
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_any(&headers).await?;

        let leagues = resources.database.get_espn_leagues(&auth.user_id).await?;
        let entries: Vec<_> = leagues
            .iter()
            .map(|league| {
                json!({
                    "platform": "espn",
                    "sport": league.sport,
                    "leagueId": league.league_id,
                    "seasonYear": league.season_year,
                    "teamId": league.team_id,
                    "teamName": league.team_name,
                    "leagueName": league.league_name,
                })
            })
            .collect();

        Ok((
            StatusCode::OK,
            Json(json!({ "leagues": entries, "totalLeagues": entries.len() })),
        )
            .into_response())
    }

    /// POST|PUT /leagues (bulk replace, capped)
    async fn handle_set(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SetLeaguesRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let leagues = request
            .leagues
            .into_iter()
            .map(|entry| entry.into_model(&auth.user_id))
            .collect::<Result<Vec<_>, _>>()?;

        resources
            .database
            .set_espn_leagues(&auth.user_id, &leagues)
            .await?;

        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "totalLeagues": leagues.len() })),
        )
            .into_response())
    }

    /// DELETE /leagues?leagueId=&sport= (all seasons of the tuple)
    async fn handle_remove(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<RemoveLeagueQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;
        let sport = parse_sport(&query.sport)?;

        let removed = resources
            .database
            .remove_espn_league(&auth.user_id, &query.league_id, sport)
            .await?;

        if !removed {
            return Err(AppError::not_found("League"));
        }

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }

    /// POST /leagues/add (single add with outcome codes)
    async fn handle_add(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(entry): Json<LeagueEntry>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;
        let league = entry.into_model(&auth.user_id)?;

        resources.database.insert_espn_league(&league).await?;

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }

    /// POST /leagues/default
    ///
    /// The referenced league must exist; for ESPN it must also have a team
    /// bound before it can become a default.
    async fn handle_set_default(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SetDefaultRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;
        let sport = parse_sport(&request.sport)?;
        let platform = Platform::from_str(&request.platform)
            .map_err(AppError::invalid_input)?;

        let exists = match platform {
            Platform::Espn => {
                resources
                    .database
                    .espn_league_exists(&auth.user_id, sport, &request.league_id, request.season_year)
                    .await?
            }
            Platform::Yahoo => {
                resources
                    .database
                    .yahoo_league_exists(&auth.user_id, &request.league_id, request.season_year)
                    .await?
            }
            Platform::Sleeper => {
                resources
                    .database
                    .sleeper_league_exists(&auth.user_id, &request.league_id, request.season_year)
                    .await?
            }
        };
        if !exists {
            return Err(AppError::not_found("League"));
        }

        if platform == Platform::Espn {
            let bound = resources
                .database
                .espn_league_has_team(&auth.user_id, sport, &request.league_id, request.season_year)
                .await?;
            if !bound {
                return Err(AppError::invalid_input(
                    "League must have a team selected before it can be a default",
                ));
            }
        }

        let league_default = LeagueDefault {
            platform,
            league_id: request.league_id,
            season_year: request.season_year,
        };
        resources
            .database
            .set_default_league(&auth.user_id, sport, Some(&league_default))
            .await?;

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }

    /// DELETE /leagues/default/:sport
    async fn handle_clear_default(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(sport): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;
        let sport = parse_sport(&sport)?;

        resources
            .database
            .set_default_league(&auth.user_id, sport, None)
            .await?;

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }

    /// PATCH /leagues/:leagueId/team
    async fn handle_bind_team(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(league_id): Path<String>,
        Json(request): Json<BindTeamRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let sport = request.sport.as_deref().map(parse_sport).transpose()?;

        let updated = resources
            .database
            .update_espn_league_team(
                &auth.user_id,
                &league_id,
                &request.team_id,
                sport,
                request.season_year,
                request.team_name.as_deref(),
                request.league_name.as_deref(),
            )
            .await?;

        if !updated {
            return Err(AppError::not_found("League"));
        }

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }

    /// GET /leagues/yahoo (IdP or eval)
    async fn handle_list_yahoo(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_any(&headers).await?;

        let leagues = resources.database.get_yahoo_leagues(&auth.user_id).await?;
        let entries: Vec<_> = leagues
            .iter()
            .map(|league| {
                json!({
                    "platform": "yahoo",
                    "leagueKey": league.league_key,
                    "seasonYear": league.season_year,
                    "sport": league.sport,
                    "leagueName": league.league_name,
                    "teamKey": league.team_key,
                    "teamName": league.team_name,
                })
            })
            .collect();

        Ok((
            StatusCode::OK,
            Json(json!({ "leagues": entries, "totalLeagues": entries.len() })),
        )
            .into_response())
    }

    /// DELETE /leagues/yahoo/:id
    async fn handle_remove_yahoo(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(league_key): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let removed = resources
            .database
            .delete_yahoo_league(&auth.user_id, &league_key)
            .await?;

        if !removed {
            return Err(AppError::not_found("League"));
        }

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }
}
