// ABOUTME: ESPN Fan API and v3 fantasy API client with cookie authentication
// ABOUTME: Enumerates fantasy memberships and fetches per-season league details
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! ESPN client
//!
//! The Fan API enumerates every fantasy membership for a SWID in one call;
//! the v3 league API supplies per-season names, team lists, and the
//! `previousSeasons` history used by discovery. Both authenticate with the
//! stored cookie pair.

use crate::errors::{AppError, ErrorCode};
use crate::models::Sport;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const FAN_API_TIMEOUT: Duration = Duration::from_secs(10);
const LEAGUE_API_TIMEOUT: Duration = Duration::from_secs(7);

/// ESPN client failures
#[derive(Debug, Error)]
pub enum EspnError {
    /// The cookies were rejected upstream
    #[error("ESPN authentication failed: {0}")]
    AuthenticationFailed(String),
    /// ESPN answered with something unusable
    #[error("ESPN API error: {0}")]
    ApiError(String),
    /// Discovery could not produce any leagues
    #[error("automatic league discovery failed: {0}")]
    DiscoveryFailed(String),
    /// The fan profile contained no fantasy memberships
    #[error("no fantasy leagues found for this account")]
    NoLeaguesFound,
}

impl From<EspnError> for AppError {
    fn from(err: EspnError) -> Self {
        match err {
            EspnError::AuthenticationFailed(message) => Self::new(
                ErrorCode::EspnAuthFailed,
                format!("ESPN authentication failed: credentials expired or invalid ({message})"),
            ),
            EspnError::ApiError(message) => Self::new(ErrorCode::EspnApiError, message),
            EspnError::DiscoveryFailed(message) => Self::new(ErrorCode::DiscoveryFailed, message),
            EspnError::NoLeaguesFound => Self::new(
                ErrorCode::DiscoveryFailed,
                "No fantasy leagues found for this account",
            ),
        }
    }
}

/// Map the Fan API's numeric game id to a sport
#[must_use]
pub const fn sport_for_game_id(game_id: i64) -> Option<Sport> {
    match game_id {
        1 => Some(Sport::Football),
        2 => Some(Sport::Baseball),
        3 => Some(Sport::Basketball),
        4 => Some(Sport::Hockey),
        _ => None,
    }
}

/// ESPN's URL game code for a sport (ffl, flb, fba, fhl)
#[must_use]
pub const fn game_code(sport: Sport) -> &'static str {
    match sport {
        Sport::Football => "ffl",
        Sport::Baseball => "flb",
        Sport::Basketball => "fba",
        Sport::Hockey => "fhl",
    }
}

/// Normalize a SWID cookie: trim, strip braces, re-wrap as `{UUID}`
#[must_use]
pub fn normalize_swid(raw: &str) -> String {
    let bare = raw.trim().trim_start_matches('{').trim_end_matches('}');
    format!("{{{bare}}}")
}

/// The bare UUID inside a SWID cookie
#[must_use]
pub fn bare_swid(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .to_owned()
}

/// One fantasy membership reported by the Fan API
#[derive(Debug, Clone)]
pub struct DiscoveredLeague {
    /// Numeric game id (1=ffl, 2=flb, 3=fba, 4=fhl)
    pub game_id: i64,
    /// League identifier
    pub league_id: String,
    /// League display name, when present
    pub league_name: Option<String>,
    /// Season the membership was reported for (platform year)
    pub season_id: i32,
    /// The user's team id in the league, when present
    pub team_id: Option<String>,
    /// The user's team name, when present
    pub team_name: Option<String>,
}

/// Per-season league details from the v3 API
#[derive(Debug, Clone, Default)]
pub struct LeagueInfo {
    /// League display name
    pub name: Option<String>,
    /// Past seasons (platform years) the league existed
    pub previous_seasons: Vec<i32>,
}

#[derive(Debug, Deserialize)]
struct FanProfile {
    #[serde(default)]
    preferences: Vec<FanPreference>,
}

#[derive(Debug, Deserialize)]
struct FanPreference {
    #[serde(rename = "type")]
    kind: Option<PreferenceType>,
    #[serde(rename = "metaData")]
    meta_data: Option<FanMetaData>,
}

#[derive(Debug, Deserialize)]
struct PreferenceType {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FanMetaData {
    entry: Option<FanEntry>,
}

#[derive(Debug, Deserialize)]
struct FanEntry {
    #[serde(rename = "entryId")]
    entry_id: Option<Value>,
    #[serde(rename = "gameId")]
    game_id: Option<i64>,
    #[serde(rename = "seasonId")]
    season_id: Option<i32>,
    #[serde(rename = "entryMetadata")]
    entry_metadata: Option<EntryMetadata>,
    #[serde(default)]
    groups: Vec<FanGroup>,
}

#[derive(Debug, Deserialize)]
struct EntryMetadata {
    #[serde(rename = "teamName")]
    team_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FanGroup {
    #[serde(rename = "groupId")]
    group_id: Option<Value>,
    #[serde(rename = "groupName")]
    group_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeagueSettingsResponse {
    settings: Option<LeagueSettings>,
    status: Option<LeagueStatus>,
}

#[derive(Debug, Deserialize)]
struct LeagueSettings {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeagueStatus {
    #[serde(rename = "previousSeasons", default)]
    previous_seasons: Vec<i32>,
}

#[derive(Debug, Deserialize)]
struct LeagueTeamsResponse {
    #[serde(default)]
    teams: Vec<LeagueTeam>,
}

#[derive(Debug, Deserialize)]
struct LeagueTeam {
    id: Option<Value>,
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Map a parsed Fan API profile to discovered leagues
///
/// Keeps preferences whose `type.code == "fantasy"` and that carry at least
/// one group; everything else (show follows, team follows) is dropped.
#[must_use]
fn map_fan_profile(profile: FanProfile) -> Vec<DiscoveredLeague> {
    profile
        .preferences
        .into_iter()
        .filter_map(|preference| {
            let is_fantasy = preference
                .kind
                .as_ref()
                .and_then(|kind| kind.code.as_deref())
                == Some("fantasy");
            if !is_fantasy {
                return None;
            }

            let entry = preference.meta_data?.entry?;
            let group = entry.groups.first()?;
            let league_id = group.group_id.as_ref().and_then(value_to_string)?;

            Some(DiscoveredLeague {
                game_id: entry.game_id?,
                league_id,
                league_name: group.group_name.clone(),
                season_id: entry.season_id?,
                team_id: entry.entry_id.as_ref().and_then(value_to_string),
                team_name: entry
                    .entry_metadata
                    .and_then(|metadata| metadata.team_name),
            })
        })
        .collect()
}

/// Parse a raw Fan API JSON document into discovered leagues
///
/// # Errors
///
/// Returns `DiscoveryFailed` when the document does not deserialize or no
/// fantasy membership survives the filter.
pub fn parse_fan_profile(body: &str) -> Result<Vec<DiscoveredLeague>, EspnError> {
    let profile: FanProfile = serde_json::from_str(body)
        .map_err(|e| EspnError::DiscoveryFailed(format!("Unparseable fan profile: {e}")))?;

    let leagues = map_fan_profile(profile);
    if leagues.is_empty() {
        return Err(EspnError::NoLeaguesFound);
    }

    Ok(leagues)
}

/// ESPN HTTP client
pub struct EspnClient {
    http: reqwest::Client,
}

impl EspnClient {
    /// Create a client sharing the given HTTP client
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn cookie_header(swid: &str, s2: &str) -> String {
        format!("SWID={swid}; espn_s2={s2}")
    }

    /// Enumerate the user's fantasy memberships via the Fan API
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` on 401/403, `DiscoveryFailed` for other
    /// upstream failures or an empty membership set.
    pub async fn fetch_fan_leagues(
        &self,
        swid: &str,
        s2: &str,
    ) -> Result<Vec<DiscoveredLeague>, EspnError> {
        let normalized = normalize_swid(swid);
        let bare = bare_swid(swid);
        let url = format!("https://fan.api.espn.com/apis/v2/fans/%7B{bare}%7D?displayEvents=true");

        let response = self
            .http
            .get(&url)
            .header("Cookie", Self::cookie_header(&normalized, s2))
            .header("x-p13n-swid", &bare)
            .header("X-Personalization-Source", "ESPN.com - FAM")
            .header("Accept", "application/json")
            .timeout(FAN_API_TIMEOUT)
            .send()
            .await
            .map_err(|e| EspnError::DiscoveryFailed(format!("Fan API request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(EspnError::AuthenticationFailed(format!(
                "Fan API returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(EspnError::DiscoveryFailed(format!(
                "Fan API returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EspnError::DiscoveryFailed(format!("Fan API body unreadable: {e}")))?;

        parse_fan_profile(&body)
    }

    /// Fetch league settings and season history from the v3 API
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` on 401/403, `ApiError` otherwise.
    pub async fn fetch_league_info(
        &self,
        sport: Sport,
        platform_year: i32,
        league_id: &str,
        swid: &str,
        s2: &str,
    ) -> Result<LeagueInfo, EspnError> {
        let url = format!(
            "https://lm-api-reads.fantasy.espn.com/apis/v3/games/{}/seasons/{platform_year}/segments/0/leagues/{league_id}?view=mSettings",
            game_code(sport)
        );

        let response: LeagueSettingsResponse = self.league_api_get(&url, swid, s2).await?;

        Ok(LeagueInfo {
            name: response.settings.and_then(|settings| settings.name),
            previous_seasons: response
                .status
                .map(|status| status.previous_seasons)
                .unwrap_or_default(),
        })
    }

    /// Fetch the team ids present in a league for one season
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` on 401/403, `ApiError` otherwise.
    pub async fn fetch_league_team_ids(
        &self,
        sport: Sport,
        platform_year: i32,
        league_id: &str,
        swid: &str,
        s2: &str,
    ) -> Result<Vec<String>, EspnError> {
        let url = format!(
            "https://lm-api-reads.fantasy.espn.com/apis/v3/games/{}/seasons/{platform_year}/segments/0/leagues/{league_id}?view=mStandings&view=mTeam",
            game_code(sport)
        );

        let response: LeagueTeamsResponse = self.league_api_get(&url, swid, s2).await?;

        Ok(response
            .teams
            .iter()
            .filter_map(|team| team.id.as_ref().and_then(value_to_string))
            .collect())
    }

    async fn league_api_get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        swid: &str,
        s2: &str,
    ) -> Result<T, EspnError> {
        let normalized = normalize_swid(swid);

        let response = self
            .http
            .get(url)
            .header("Cookie", Self::cookie_header(&normalized, s2))
            .header("Accept", "application/json")
            .timeout(LEAGUE_API_TIMEOUT)
            .send()
            .await
            .map_err(|e| EspnError::ApiError(format!("League API request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(EspnError::AuthenticationFailed(format!(
                "League API returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(EspnError::ApiError(format!("League API returned {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| EspnError::ApiError(format!("League API body unparseable: {e}")))
    }
}
