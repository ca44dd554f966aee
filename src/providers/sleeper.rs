// ABOUTME: Sleeper public API client and username-based league discovery
// ABOUTME: Fans out per sport with settled semantics and walks bounded league history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Sleeper connector
//!
//! Sleeper has no per-user secret: linking is by public username. Discovery
//! resolves the username, saves the connection, then enumerates current
//! leagues per sport and walks each league's `previous_league_id` chain a
//! bounded number of steps. One sport's failure never poisons the other.

use crate::database::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{SleeperConnection, SleeperLeague, Sport};
use crate::season;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.sleeper.app/v1";

/// Maximum `previous_league_id` hops walked per league
pub const MAX_HISTORY_DEPTH: usize = 5;

/// Sports Sleeper discovery fans out over, with their API codes
const DISCOVERY_SPORTS: [(Sport, &str); 2] =
    [(Sport::Football, "nfl"), (Sport::Basketball, "nba")];

/// A Sleeper user record
#[derive(Debug, Clone, Deserialize)]
pub struct SleeperApiUser {
    /// Numeric user id as a string
    pub user_id: String,
    /// Username at lookup time
    pub username: Option<String>,
    /// Display name
    pub display_name: Option<String>,
}

/// A Sleeper league record
#[derive(Debug, Clone, Deserialize)]
pub struct SleeperApiLeague {
    /// League identifier
    pub league_id: String,
    /// League display name
    pub name: Option<String>,
    /// Season, reported as a string year
    pub season: String,
    /// Prior season's league id, when the league has history
    pub previous_league_id: Option<String>,
}

/// A Sleeper roster entry
#[derive(Debug, Clone, Deserialize)]
pub struct SleeperRoster {
    /// Roster id within the league
    pub roster_id: i64,
    /// Owning Sleeper user id
    pub owner_id: Option<String>,
}

/// Find the roster owned by the given Sleeper user
#[must_use]
pub fn match_roster(rosters: &[SleeperRoster], sleeper_user_id: &str) -> Option<i64> {
    rosters
        .iter()
        .find(|roster| roster.owner_id.as_deref() == Some(sleeper_user_id))
        .map(|roster| roster.roster_id)
}

/// Aggregated discovery response
#[derive(Debug, Clone, Serialize)]
pub struct SleeperDiscoveryResult {
    /// True iff at least one league was saved
    pub success: bool,
    /// The username that was linked
    pub username: String,
    /// Current-season leagues saved
    pub leagues_found: usize,
    /// Total (league, season) rows saved including history
    pub seasons_discovered: usize,
    /// Present when nothing was saved and at least one fetch failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Sleeper HTTP client
pub struct SleeperClient {
    http: reqwest::Client,
}

impl SleeperClient {
    /// Create a client sharing the given HTTP client
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::new(ErrorCode::ExternalServiceError, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::new(
                ErrorCode::ExternalServiceError,
                format!("Sleeper API returned {status} for {url}"),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::new(ErrorCode::ExternalServiceError, e.to_string()))
    }

    /// Look up a user by username; `None` when Sleeper reports no such user
    ///
    /// Sleeper answers unknown usernames with HTTP 200 and a literal `null`
    /// body, which deserializes to `None` here.
    ///
    /// # Errors
    ///
    /// Returns an error for non-2xx responses (rate limiting, outages).
    pub async fn get_user(&self, username: &str) -> AppResult<Option<SleeperApiUser>> {
        self.get_json(&format!("{API_BASE}/user/{username}")).await
    }

    /// List a user's leagues for one sport and season
    ///
    /// # Errors
    ///
    /// Returns an error for transport or upstream failures.
    pub async fn get_user_leagues(
        &self,
        sleeper_user_id: &str,
        sport_code: &str,
        season_year: i32,
    ) -> AppResult<Vec<SleeperApiLeague>> {
        let leagues: Option<Vec<SleeperApiLeague>> = self
            .get_json(&format!(
                "{API_BASE}/user/{sleeper_user_id}/leagues/{sport_code}/{season_year}"
            ))
            .await?;
        Ok(leagues.unwrap_or_default())
    }

    /// Fetch one league by id; `None` when Sleeper reports no such league
    ///
    /// # Errors
    ///
    /// Returns an error for transport or upstream failures.
    pub async fn get_league(&self, league_id: &str) -> AppResult<Option<SleeperApiLeague>> {
        self.get_json(&format!("{API_BASE}/league/{league_id}")).await
    }

    /// Fetch the rosters of one league
    ///
    /// # Errors
    ///
    /// Returns an error for transport or upstream failures.
    pub async fn get_league_rosters(&self, league_id: &str) -> AppResult<Vec<SleeperRoster>> {
        let rosters: Option<Vec<SleeperRoster>> = self
            .get_json(&format!("{API_BASE}/league/{league_id}/rosters"))
            .await?;
        Ok(rosters.unwrap_or_default())
    }
}

/// Outcome of one sport's discovery pass
struct SportOutcome {
    leagues_saved: usize,
    seasons_saved: usize,
    failure: Option<String>,
}

/// Sleeper username discovery
pub struct SleeperConnector {
    client: SleeperClient,
    database: Database,
}

impl SleeperConnector {
    /// Create a connector
    #[must_use]
    pub const fn new(client: SleeperClient, database: Database) -> Self {
        Self { client, database }
    }

    /// Link a username and discover leagues across sports and seasons
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` with a human message when the username does
    /// not exist, or an upstream error when the initial lookup fails. Sport
    /// and league failures after the connection is saved are absorbed into
    /// the aggregate result.
    pub async fn discover(
        &self,
        user_id: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> AppResult<SleeperDiscoveryResult> {
        let user = self
            .client
            .get_user(username)
            .await?
            .ok_or_else(|| {
                AppError::new(
                    ErrorCode::ResourceNotFound,
                    format!("No Sleeper account found for username '{username}'"),
                )
            })?;

        let connection = SleeperConnection {
            user_id: user_id.to_owned(),
            sleeper_user_id: user.user_id.clone(),
            sleeper_username: user.username.unwrap_or_else(|| username.to_owned()),
        };
        self.database.upsert_sleeper_connection(&connection).await?;

        // Settled fan-out: each sport runs to completion independently
        let passes = DISCOVERY_SPORTS.map(|(sport, code)| {
            let sleeper_user_id = connection.sleeper_user_id.clone();
            async move {
                self.discover_sport(user_id, &sleeper_user_id, sport, code, now)
                    .await
            }
        });
        let outcomes = join_all(passes).await;

        let mut leagues_found = 0;
        let mut seasons_discovered = 0;
        let mut failures = Vec::new();
        for outcome in outcomes {
            leagues_found += outcome.leagues_saved;
            seasons_discovered += outcome.seasons_saved;
            if let Some(failure) = outcome.failure {
                failures.push(failure);
            }
        }

        let success = seasons_discovered > 0;
        let warning = if !success && !failures.is_empty() {
            Some(format!(
                "No leagues saved; some lookups failed: {}",
                failures.join("; ")
            ))
        } else {
            None
        };

        Ok(SleeperDiscoveryResult {
            success,
            username: connection.sleeper_username,
            leagues_found,
            seasons_discovered,
            warning,
        })
    }

    async fn discover_sport(
        &self,
        user_id: &str,
        sleeper_user_id: &str,
        sport: Sport,
        sport_code: &str,
        now: DateTime<Utc>,
    ) -> SportOutcome {
        let season_year = season::default_season_year(sport, now);

        let leagues = match self
            .client
            .get_user_leagues(sleeper_user_id, sport_code, season_year)
            .await
        {
            Ok(leagues) => leagues,
            Err(e) => {
                tracing::warn!(sport = %sport, "Sleeper league fetch failed: {e}");
                return SportOutcome {
                    leagues_saved: 0,
                    seasons_saved: 0,
                    failure: Some(format!("{sport}: {e}")),
                };
            }
        };

        let mut leagues_saved = 0;
        let mut seasons_saved = 0;
        for league in leagues {
            // Per-league error boundary: one league's failure is logged and skipped
            match self
                .save_league_with_history(user_id, sleeper_user_id, sport, &league, season_year)
                .await
            {
                Ok(saved) => {
                    leagues_saved += 1;
                    seasons_saved += saved;
                }
                Err(e) => {
                    tracing::warn!(
                        league_id = %league.league_id,
                        sport = %sport,
                        "Skipping Sleeper league after error: {e}"
                    );
                }
            }
        }

        SportOutcome {
            leagues_saved,
            seasons_saved,
            failure: None,
        }
    }

    /// Save one current-season league and walk its bounded history chain
    ///
    /// Returns the number of (league, season) rows saved.
    async fn save_league_with_history(
        &self,
        user_id: &str,
        sleeper_user_id: &str,
        sport: Sport,
        league: &SleeperApiLeague,
        season_year: i32,
    ) -> AppResult<usize> {
        let mut saved = 0;

        let roster_id = match self.client.get_league_rosters(&league.league_id).await {
            Ok(rosters) => match_roster(&rosters, sleeper_user_id),
            Err(e) => {
                tracing::debug!(league_id = %league.league_id, "Roster fetch failed: {e}");
                None
            }
        };

        self.database
            .upsert_sleeper_league(&SleeperLeague {
                user_id: user_id.to_owned(),
                league_id: league.league_id.clone(),
                season_year: league.season.parse().unwrap_or(season_year),
                sport,
                league_name: league.name.clone(),
                roster_id,
            })
            .await?;
        saved += 1;

        let mut previous_id = league.previous_league_id.clone();
        for _ in 0..MAX_HISTORY_DEPTH {
            let Some(league_id) = previous_id.filter(|id| !id.is_empty() && id.as_str() != "0")
            else {
                break;
            };

            // Per-season error boundary: stop walking on failure, keep what we have
            let past = match self.client.get_league(&league_id).await {
                Ok(Some(past)) => past,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(league_id = %league_id, "History fetch failed: {e}");
                    break;
                }
            };

            let past_roster_id = match self.client.get_league_rosters(&past.league_id).await {
                Ok(rosters) => match_roster(&rosters, sleeper_user_id),
                Err(_) => None,
            };

            let Ok(past_season) = past.season.parse::<i32>() else {
                break;
            };

            self.database
                .upsert_sleeper_league(&SleeperLeague {
                    user_id: user_id.to_owned(),
                    league_id: past.league_id.clone(),
                    season_year: past_season,
                    sport,
                    league_name: past.name.clone(),
                    roster_id: past_roster_id,
                })
                .await?;
            saved += 1;

            previous_id = past.previous_league_id;
        }

        Ok(saved)
    }
}
