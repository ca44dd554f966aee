// ABOUTME: ESPN league discovery engine with multi-season membership validation
// ABOUTME: Enumerates fan-API memberships, persists leagues, and walks season history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! League discovery engine
//!
//! One Fan API call enumerates every membership; each league is then
//! historized through the v3 API's `previousSeasons` list. A past season
//! counts as `found` only when the user's team id appears in that season's
//! team list, so departed members do not accumulate ghost seasons. Every
//! league and every season runs inside its own error boundary.

use crate::database::Database;
use crate::errors::ErrorCode;
use crate::models::{EspnLeague, Platform, Sport};
use crate::providers::espn::{sport_for_game_id, EspnClient, EspnError};
use crate::season;
use serde::Serialize;

/// Disjoint counting buckets for one traversal scope
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DiscoveryCounts {
    /// Seasons where the user was a verified member
    pub found: usize,
    /// Seasons newly inserted
    pub added: usize,
    /// Seasons already present in storage
    #[serde(rename = "alreadySaved")]
    pub already_saved: usize,
}

/// Summary of one discovered membership (current season)
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredSummary {
    /// Sport of the league
    pub sport: Sport,
    /// League identifier
    #[serde(rename = "leagueId")]
    pub league_id: String,
    /// League display name, when reported
    #[serde(rename = "leagueName")]
    pub league_name: Option<String>,
    /// Canonical season year
    #[serde(rename = "seasonYear")]
    pub season_year: i32,
    /// The user's team id, when reported
    #[serde(rename = "teamId")]
    pub team_id: Option<String>,
    /// The user's team name, when reported
    #[serde(rename = "teamName")]
    pub team_name: Option<String>,
}

/// Aggregate discovery result
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryResult {
    /// Every membership the Fan API reported (after filtering)
    pub discovered: Vec<DiscoveredSummary>,
    /// Current-season counts
    #[serde(rename = "currentSeason")]
    pub current_season: DiscoveryCounts,
    /// Historical-season counts
    #[serde(rename = "pastSeasons")]
    pub past_seasons: DiscoveryCounts,
}

/// Whether the user's team id appears in a season's team list
///
/// Ids are compared as strings because ESPN mixes numeric and string team
/// ids across API versions.
#[must_use]
pub fn season_membership_verified(team_ids: &[String], team_id: &str) -> bool {
    team_ids.iter().any(|id| id == team_id)
}

/// ESPN league discovery engine
pub struct LeagueDiscoveryEngine {
    client: EspnClient,
    database: Database,
}

impl LeagueDiscoveryEngine {
    /// Create an engine
    #[must_use]
    pub const fn new(client: EspnClient, database: Database) -> Self {
        Self { client, database }
    }

    /// Run discovery for a user's stored cookie pair
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` when ESPN rejects the cookies,
    /// `NoLeaguesFound` when the fan profile holds no fantasy memberships,
    /// and `DiscoveryFailed` for other enumeration failures. Failures after
    /// enumeration are absorbed by per-league and per-season boundaries.
    pub async fn run(
        &self,
        user_id: &str,
        swid: &str,
        s2: &str,
    ) -> Result<DiscoveryResult, EspnError> {
        let memberships = self.client.fetch_fan_leagues(swid, s2).await?;
        tracing::info!(
            user_id = %user_id,
            count = memberships.len(),
            "Fan API enumeration complete"
        );

        let mut result = DiscoveryResult::default();

        for membership in memberships {
            let Some(sport) = sport_for_game_id(membership.game_id) else {
                tracing::debug!(game_id = membership.game_id, "Skipping unknown game id");
                continue;
            };

            let season_year =
                season::to_canonical_year(membership.season_id, sport, Platform::Espn);

            result.discovered.push(DiscoveredSummary {
                sport,
                league_id: membership.league_id.clone(),
                league_name: membership.league_name.clone(),
                season_year,
                team_id: membership.team_id.clone(),
                team_name: membership.team_name.clone(),
            });

            // Per-league boundary: a failing league never aborts the run
            if let Err(e) = self
                .process_league(
                    user_id,
                    swid,
                    s2,
                    sport,
                    season_year,
                    membership.season_id,
                    &membership.league_id,
                    membership.team_id.as_deref(),
                    membership.team_name.as_deref(),
                    membership.league_name.as_deref(),
                    &mut result,
                )
                .await
            {
                tracing::warn!(
                    league_id = %membership.league_id,
                    sport = %sport,
                    "League processing failed, continuing: {e}"
                );
            }
        }

        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_league(
        &self,
        user_id: &str,
        swid: &str,
        s2: &str,
        sport: Sport,
        season_year: i32,
        platform_year: i32,
        league_id: &str,
        team_id: Option<&str>,
        team_name: Option<&str>,
        league_name: Option<&str>,
        result: &mut DiscoveryResult,
    ) -> Result<(), EspnError> {
        result.current_season.found += 1;

        let already = self
            .database
            .espn_league_exists(user_id, sport, league_id, season_year)
            .await
            .map_err(|e| EspnError::ApiError(e.to_string()))?;

        if already {
            result.current_season.already_saved += 1;
        } else {
            let league = EspnLeague {
                user_id: user_id.to_owned(),
                sport,
                league_id: league_id.to_owned(),
                season_year,
                team_id: team_id.map(str::to_owned),
                team_name: team_name.map(str::to_owned),
                league_name: league_name.map(str::to_owned),
            };
            match self.database.insert_espn_league(&league).await {
                Ok(()) => result.current_season.added += 1,
                Err(e) if e.code == ErrorCode::DuplicateResource => {
                    result.current_season.already_saved += 1;
                }
                Err(e) if e.code == ErrorCode::LimitExceeded => {
                    tracing::warn!(user_id = %user_id, "League cap reached during discovery");
                    return Ok(());
                }
                Err(e) => return Err(EspnError::ApiError(e.to_string())),
            }
        }

        self.process_history(
            user_id,
            swid,
            s2,
            sport,
            platform_year,
            league_id,
            team_id,
            result,
        )
        .await;

        Ok(())
    }

    /// Walk `previousSeasons`, validating membership season by season
    #[allow(clippy::too_many_arguments)]
    async fn process_history(
        &self,
        user_id: &str,
        swid: &str,
        s2: &str,
        sport: Sport,
        platform_year: i32,
        league_id: &str,
        team_id: Option<&str>,
        result: &mut DiscoveryResult,
    ) {
        let info = match self
            .client
            .fetch_league_info(sport, platform_year, league_id, swid, s2)
            .await
        {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!(league_id = %league_id, "League info fetch failed: {e}");
                return;
            }
        };

        // Membership in past seasons can only be verified with a team id
        let Some(team_id) = team_id else {
            return;
        };

        for past_year in info.previous_seasons {
            if past_year == platform_year {
                continue;
            }

            // Per-season boundary
            if let Err(e) = self
                .process_past_season(user_id, swid, s2, sport, past_year, league_id, team_id, result)
                .await
            {
                tracing::debug!(
                    league_id = %league_id,
                    past_year,
                    "Past season skipped after error: {e}"
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_past_season(
        &self,
        user_id: &str,
        swid: &str,
        s2: &str,
        sport: Sport,
        past_year: i32,
        league_id: &str,
        team_id: &str,
        result: &mut DiscoveryResult,
    ) -> Result<(), EspnError> {
        let team_ids = self
            .client
            .fetch_league_team_ids(sport, past_year, league_id, swid, s2)
            .await?;

        // The user's membership is what makes a season count; ESPN merely
        // reporting the season does not.
        if !season_membership_verified(&team_ids, team_id) {
            return Ok(());
        }

        result.past_seasons.found += 1;

        let season_year = season::to_canonical_year(past_year, sport, Platform::Espn);
        let already = self
            .database
            .espn_league_exists(user_id, sport, league_id, season_year)
            .await
            .map_err(|e| EspnError::ApiError(e.to_string()))?;

        if already {
            result.past_seasons.already_saved += 1;
            return Ok(());
        }

        // Fetch the season's own info so the stored row carries the
        // historical league name
        let info = self
            .client
            .fetch_league_info(sport, past_year, league_id, swid, s2)
            .await
            .unwrap_or_default();

        let league = EspnLeague {
            user_id: user_id.to_owned(),
            sport,
            league_id: league_id.to_owned(),
            season_year,
            team_id: Some(team_id.to_owned()),
            team_name: None,
            league_name: info.name,
        };

        match self.database.insert_espn_league(&league).await {
            Ok(()) => {
                result.past_seasons.added += 1;
                Ok(())
            }
            Err(e) if e.code == ErrorCode::DuplicateResource => {
                result.past_seasons.already_saved += 1;
                Ok(())
            }
            Err(e) if e.code == ErrorCode::LimitExceeded => {
                tracing::debug!(user_id = %user_id, "League cap reached during historization");
                Ok(())
            }
            Err(e) => Err(EspnError::ApiError(e.to_string())),
        }
    }
}
