// ABOUTME: Core domain models for platform credentials, leagues, preferences, and OAuth records
// ABOUTME: Defines sports, platforms, stored entities, and credential validation helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of (league, season) rows a user may hold per platform
pub const MAX_LEAGUES_PER_USER: usize = 10;

/// Minutes before expiry at which a Yahoo token is considered refresh-due
pub const YAHOO_REFRESH_BUFFER_MINUTES: i64 = 5;

/// Supported fantasy sports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    /// Fantasy football
    Football,
    /// Fantasy baseball
    Baseball,
    /// Fantasy basketball
    Basketball,
    /// Fantasy hockey
    Hockey,
}

impl Sport {
    /// All supported sports
    pub const ALL: [Self; 4] = [Self::Football, Self::Baseball, Self::Basketball, Self::Hockey];

    /// Canonical lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Football => "football",
            Self::Baseball => "baseball",
            Self::Basketball => "basketball",
            Self::Hockey => "hockey",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "football" => Ok(Self::Football),
            "baseball" => Ok(Self::Baseball),
            "basketball" => Ok(Self::Basketball),
            "hockey" => Ok(Self::Hockey),
            other => Err(format!("invalid_sport: {other}")),
        }
    }
}

/// Supported fantasy platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// ESPN (cookie-based authentication)
    Espn,
    /// Yahoo (OAuth 2.0)
    Yahoo,
    /// Sleeper (public API)
    Sleeper,
}

impl Platform {
    /// Canonical lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Espn => "espn",
            Self::Yahoo => "yahoo",
            Self::Sleeper => "sleeper",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "espn" => Ok(Self::Espn),
            "yahoo" => Ok(Self::Yahoo),
            "sleeper" => Ok(Self::Sleeper),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Stored ESPN cookie pair for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EspnCredential {
    /// Owning user principal (opaque IdP subject)
    pub user_id: String,
    /// SWID cookie, `{UUID}` format
    pub swid: String,
    /// `espn_s2` cookie
    pub s2: String,
    /// Email captured at save time, if provided
    pub email: Option<String>,
    /// Last write timestamp
    pub updated_at: DateTime<Utc>,
}

impl EspnCredential {
    /// True when both cookie values are present and non-empty
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.swid.is_empty() && !self.s2.is_empty()
    }
}

/// Validate the SWID cookie format: `{` + 36 hex/dash characters + `}`
#[must_use]
pub fn is_valid_swid(swid: &str) -> bool {
    let Some(inner) = swid.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
        return false;
    };
    inner.len() == 36 && inner.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// Validate the `espn_s2` cookie format (opaque, length-checked only)
#[must_use]
pub fn is_valid_s2(s2: &str) -> bool {
    s2.len() >= 50
}

/// One ESPN league membership for one season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EspnLeague {
    /// Owning user principal
    pub user_id: String,
    /// Sport of the league
    pub sport: Sport,
    /// ESPN league identifier
    pub league_id: String,
    /// Canonical season year (start year of the season)
    pub season_year: i32,
    /// User's team id within the league, when known
    pub team_id: Option<String>,
    /// User's team name, when known
    pub team_name: Option<String>,
    /// League display name, when known
    pub league_name: Option<String>,
}

/// Stored Yahoo OAuth tokens for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooCredential {
    /// Owning user principal
    pub user_id: String,
    /// Current access token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// Access-token expiry
    pub expires_at: DateTime<Utc>,
    /// Yahoo account GUID, when known
    pub yahoo_guid: Option<String>,
}

impl YahooCredential {
    /// Whether the access token is inside the proactive refresh window
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now < chrono::Duration::minutes(YAHOO_REFRESH_BUFFER_MINUTES)
    }

    /// Seconds until the access token expires (clamped at zero)
    #[must_use]
    pub fn expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// One Yahoo league membership for one season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooLeague {
    /// Owning user principal
    pub user_id: String,
    /// Yahoo league key (e.g. `nfl.l.12345`)
    pub league_key: String,
    /// Canonical season year
    pub season_year: i32,
    /// Sport of the league
    pub sport: Sport,
    /// League display name, when known
    pub league_name: Option<String>,
    /// User's team key within the league, when known
    pub team_key: Option<String>,
    /// User's team name, when known
    pub team_name: Option<String>,
}

/// Stored Sleeper identity linkage for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperConnection {
    /// Owning user principal
    pub user_id: String,
    /// Sleeper numeric user id
    pub sleeper_user_id: String,
    /// Sleeper username at link time
    pub sleeper_username: String,
}

/// One Sleeper league membership for one season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperLeague {
    /// Owning user principal
    pub user_id: String,
    /// Sleeper league identifier
    pub league_id: String,
    /// Canonical season year
    pub season_year: i32,
    /// Sport of the league
    pub sport: Sport,
    /// League display name, when known
    pub league_name: Option<String>,
    /// User's roster id within the league, when known
    pub roster_id: Option<i64>,
}

/// Default league selection for one sport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueDefault {
    /// Platform the default league lives on
    pub platform: Platform,
    /// League identifier (platform-specific)
    #[serde(rename = "leagueId")]
    pub league_id: String,
    /// Canonical season year
    #[serde(rename = "seasonYear")]
    pub season_year: i32,
}

/// Per-user preference record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Preferred sport, when set
    pub default_sport: Option<Sport>,
    /// Default football league
    pub default_football: Option<LeagueDefault>,
    /// Default baseball league
    pub default_baseball: Option<LeagueDefault>,
    /// Default basketball league
    pub default_basketball: Option<LeagueDefault>,
    /// Default hockey league
    pub default_hockey: Option<LeagueDefault>,
}

impl UserPreferences {
    /// Read the default league for a sport
    #[must_use]
    pub fn default_for(&self, sport: Sport) -> Option<&LeagueDefault> {
        match sport {
            Sport::Football => self.default_football.as_ref(),
            Sport::Baseball => self.default_baseball.as_ref(),
            Sport::Basketball => self.default_basketball.as_ref(),
            Sport::Hockey => self.default_hockey.as_ref(),
        }
    }
}

/// Stored OAuth 2.1 authorization code
#[derive(Debug, Clone)]
pub struct OAuthCode {
    /// Random URL-safe code value
    pub code: String,
    /// Principal the code was minted for
    pub user_id: String,
    /// Redirect URI bound at mint time
    pub redirect_uri: String,
    /// Granted scope
    pub scope: String,
    /// RFC 8707 resource indicator, when requested
    pub resource: Option<String>,
    /// Client CSRF state bound at mint time
    pub state: Option<String>,
    /// PKCE code challenge
    pub code_challenge: Option<String>,
    /// PKCE challenge method (`S256`)
    pub code_challenge_method: Option<String>,
    /// Expiry (10 minutes after mint)
    pub expires_at: DateTime<Utc>,
    /// Consumption timestamp; transitions from `None` exactly once
    pub used_at: Option<DateTime<Utc>>,
    /// Mint timestamp
    pub created_at: DateTime<Utc>,
}

/// Stored OAuth 2.1 access token (with optional attached refresh token)
#[derive(Debug, Clone)]
pub struct OAuthToken {
    /// Random access-token value
    pub access_token: String,
    /// Principal the token was minted for
    pub user_id: String,
    /// Granted scope
    pub scope: String,
    /// RFC 8707 resource indicator, when bound
    pub resource: Option<String>,
    /// Display name of the client (derived from redirect URI when absent)
    pub client_name: String,
    /// Access-token expiry (1 hour)
    pub expires_at: DateTime<Utc>,
    /// Revocation timestamp, when revoked
    pub revoked_at: Option<DateTime<Utc>>,
    /// Attached refresh token
    pub refresh_token: Option<String>,
    /// Refresh-token expiry (7 days)
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    /// Mint timestamp
    pub created_at: DateTime<Utc>,
}

/// Stored inbound (MCP client) CSRF state
#[derive(Debug, Clone)]
pub struct OAuthState {
    /// Random state value
    pub state: String,
    /// Principal, when known at store time
    pub user_id: Option<String>,
    /// Client id, when known
    pub client_id: Option<String>,
    /// Redirect URI, when known
    pub redirect_uri: Option<String>,
    /// Expiry (10 minutes after store)
    pub expires_at: DateTime<Utc>,
}

/// Stored outbound (platform) CSRF state
#[derive(Debug, Clone)]
pub struct PlatformOAuthState {
    /// Random state value (`<userId>:<uuid>`)
    pub state: String,
    /// Principal starting the outbound flow
    pub user_id: String,
    /// Target platform
    pub platform: Platform,
    /// Expiry (10 minutes after store)
    pub expires_at: DateTime<Utc>,
}
