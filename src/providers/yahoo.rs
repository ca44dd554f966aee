// ABOUTME: Yahoo OAuth 2.0 client and fantasy league enumeration
// ABOUTME: Handles authorization URLs, HTTP Basic token exchange, and proactive refresh
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::config::environment::YahooConfig;
use crate::database::Database;
use crate::errors::{AppError, ErrorCode};
use crate::models::{Sport, YahooCredential, YahooLeague};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const AUTH_URL: &str = "https://api.login.yahoo.com/oauth2/request_auth";
const TOKEN_URL: &str = "https://api.login.yahoo.com/oauth2/get_token";
const FANTASY_API: &str = "https://fantasysports.yahooapis.com/fantasy/v2";

/// OAuth scope requested from Yahoo (fantasy sports, read)
pub const YAHOO_SCOPE: &str = "fspt-r";

/// Yahoo connector failures
#[derive(Debug, Error)]
pub enum YahooError {
    /// Yahoo is not configured for this deployment
    #[error("Yahoo OAuth is not configured")]
    NotConfigured,
    /// The user has no stored Yahoo credentials
    #[error("Yahoo is not connected for this user")]
    NotConnected,
    /// Code-for-token exchange failed
    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),
    /// Refresh request failed
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
    /// Fantasy API call failed
    #[error("Yahoo API error: {0}")]
    ApiError(String),
}

impl YahooError {
    /// Error kind forwarded to the frontend as `?error=<kind>`
    #[must_use]
    pub const fn redirect_kind(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::NotConnected => "not_connected",
            Self::TokenExchangeFailed(_) => "token_exchange_failed",
            Self::RefreshFailed(_) => "refresh_failed",
            Self::ApiError(_) => "yahoo_api_error",
        }
    }
}

impl From<YahooError> for AppError {
    fn from(err: YahooError) -> Self {
        match err {
            YahooError::NotConfigured => Self::config("Yahoo OAuth is not configured"),
            YahooError::NotConnected => {
                Self::new(ErrorCode::PlatformNotConnected, "Yahoo is not connected")
            }
            YahooError::TokenExchangeFailed(message) => {
                Self::new(ErrorCode::ExternalServiceError, message)
            }
            YahooError::RefreshFailed(message) => Self::new(ErrorCode::RefreshFailed, message),
            YahooError::ApiError(message) => Self::new(ErrorCode::ExternalServiceError, message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
    xoauth_yahoo_guid: Option<String>,
}

/// Token pair returned by exchange and refresh
#[derive(Debug, Clone)]
pub struct YahooTokens {
    /// Access token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// Computed expiry
    pub expires_at: chrono::DateTime<Utc>,
    /// Yahoo account GUID, when reported
    pub yahoo_guid: Option<String>,
}

/// One fantasy league reported by the Yahoo API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredYahooLeague {
    /// League key (e.g. `nfl.l.12345`)
    pub league_key: String,
    /// League display name
    pub league_name: Option<String>,
    /// Season year as reported by Yahoo
    pub season_year: i32,
    /// Sport mapped from the game code
    pub sport: Sport,
}

fn sport_for_game_code(code: &str) -> Option<Sport> {
    match code {
        "nfl" => Some(Sport::Football),
        "mlb" => Some(Sport::Baseball),
        "nba" => Some(Sport::Basketball),
        "nhl" => Some(Sport::Hockey),
        _ => None,
    }
}

/// Walk Yahoo's deeply nested fantasy payload and pull out league entries
///
/// Yahoo mixes arrays and numerically keyed objects at every level, so this
/// walks the tree generically looking for objects that carry a `league_key`.
/// The game code prefix of the key supplies the sport.
#[must_use]
pub fn parse_user_leagues(document: &Value) -> Vec<DiscoveredYahooLeague> {
    let mut found = Vec::new();
    collect_leagues(document, &mut found);
    found
}

fn collect_leagues(node: &Value, found: &mut Vec<DiscoveredYahooLeague>) {
    match node {
        Value::Object(map) => {
            if let Some(league) = league_from_object(map) {
                found.push(league);
            }
            for value in map.values() {
                collect_leagues(value, found);
            }
        }
        Value::Array(items) => {
            for value in items {
                collect_leagues(value, found);
            }
        }
        _ => {}
    }
}

fn league_from_object(
    map: &serde_json::Map<String, Value>,
) -> Option<DiscoveredYahooLeague> {
    let league_key = map.get("league_key")?.as_str()?.to_owned();
    let game_code = league_key.split('.').next()?;
    let sport = sport_for_game_code(game_code)?;

    let season_year = match map.get("season") {
        Some(Value::String(s)) => s.parse().ok()?,
        Some(Value::Number(n)) => i32::try_from(n.as_i64()?).ok()?,
        _ => return None,
    };

    Some(DiscoveredYahooLeague {
        league_key,
        league_name: map.get("name").and_then(Value::as_str).map(str::to_owned),
        season_year,
        sport,
    })
}

/// Yahoo OAuth 2.0 client
pub struct YahooOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl YahooOAuthClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when client credentials are absent.
    pub fn from_config(config: &YahooConfig, http: reqwest::Client) -> Result<Self, YahooError> {
        let client_id = config.client_id.clone().ok_or(YahooError::NotConfigured)?;
        let client_secret = config
            .client_secret
            .clone()
            .ok_or(YahooError::NotConfigured)?;

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: config.redirect_uri.clone(),
            http,
        })
    }

    /// Authorization URL the user is redirected to
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(YAHOO_SCOPE),
            urlencoding::encode(state)
        )
    }

    fn basic_auth(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(pair))
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
    ) -> Result<YahooTokenResponse, reqwest::Error> {
        self.http
            .post(TOKEN_URL)
            .header("Authorization", self.basic_auth())
            .form(params)
            .send()
            .await?
            .error_for_status()?
            .json::<YahooTokenResponse>()
            .await
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns `TokenExchangeFailed` when the exchange fails or the response
    /// omits a refresh token.
    pub async fn exchange_code(&self, code: &str) -> Result<YahooTokens, YahooError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .token_request(&params)
            .await
            .map_err(|e| YahooError::TokenExchangeFailed(e.to_string()))?;

        let refresh_token = response.refresh_token.ok_or_else(|| {
            YahooError::TokenExchangeFailed("Yahoo response did not include a refresh token".into())
        })?;

        Ok(YahooTokens {
            access_token: response.access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
            yahoo_guid: response.xoauth_yahoo_guid,
        })
    }

    /// Refresh an access token
    ///
    /// # Errors
    ///
    /// Returns `RefreshFailed` when Yahoo rejects the refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<YahooTokens, YahooError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .token_request(&params)
            .await
            .map_err(|e| YahooError::RefreshFailed(e.to_string()))?;

        Ok(YahooTokens {
            access_token: response.access_token,
            // Yahoo may rotate the refresh token; keep the old one otherwise
            refresh_token: response
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_owned()),
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
            yahoo_guid: response.xoauth_yahoo_guid,
        })
    }

    /// Enumerate the signed-in user's fantasy leagues
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the fantasy API call fails.
    pub async fn fetch_user_leagues(
        &self,
        access_token: &str,
    ) -> Result<Vec<DiscoveredYahooLeague>, YahooError> {
        let url = format!(
            "{FANTASY_API}/users;use_login=1/games;game_codes=nfl,mlb,nba,nhl/leagues?format=json"
        );

        let document: Value = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| YahooError::ApiError(e.to_string()))?
            .error_for_status()
            .map_err(|e| YahooError::ApiError(e.to_string()))?
            .json()
            .await
            .map_err(|e| YahooError::ApiError(format!("Unparseable fantasy payload: {e}")))?;

        Ok(parse_user_leagues(&document))
    }
}

/// Yahoo credential lifecycle manager
///
/// Owns the read-with-proactive-refresh path shared by the credentials
/// endpoint and league discovery. Concurrent refreshes inside the buffer are
/// tolerated; the last writer wins.
pub struct YahooManager {
    database: Database,
    oauth: YahooOAuthClient,
}

impl YahooManager {
    /// Create a manager
    #[must_use]
    pub const fn new(database: Database, oauth: YahooOAuthClient) -> Self {
        Self { database, oauth }
    }

    /// Access the OAuth client
    #[must_use]
    pub const fn oauth(&self) -> &YahooOAuthClient {
        &self.oauth
    }

    /// Fetch credentials, refreshing synchronously inside the expiry buffer
    ///
    /// A failed refresh surfaces as `RefreshFailed` and leaves the stored
    /// refresh token untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` when no credentials are stored, `RefreshFailed`
    /// when a due refresh is rejected upstream.
    pub async fn get_valid_credentials(&self, user_id: &str) -> Result<YahooCredential, AppError> {
        let credential = self
            .database
            .get_yahoo_credentials(user_id)
            .await?
            .ok_or(YahooError::NotConnected)?;

        let now = Utc::now();
        if !credential.needs_refresh(now) {
            return Ok(credential);
        }

        tracing::info!(user_id = %user_id, "Yahoo token inside refresh buffer, refreshing");

        let tokens = self
            .oauth
            .refresh(&credential.refresh_token)
            .await
            .map_err(AppError::from)?;

        self.database
            .update_yahoo_tokens(
                user_id,
                &tokens.access_token,
                &tokens.refresh_token,
                tokens.expires_at,
            )
            .await?;

        Ok(YahooCredential {
            user_id: user_id.to_owned(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            yahoo_guid: credential.yahoo_guid,
        })
    }

    /// Discover and upsert the user's Yahoo leagues
    ///
    /// # Errors
    ///
    /// Returns the credential errors of [`Self::get_valid_credentials`] or
    /// `ApiError` when enumeration fails.
    pub async fn discover_leagues(&self, user_id: &str) -> Result<Vec<YahooLeague>, AppError> {
        let credential = self.get_valid_credentials(user_id).await?;

        let discovered = self
            .oauth
            .fetch_user_leagues(&credential.access_token)
            .await
            .map_err(AppError::from)?;

        let mut saved = Vec::with_capacity(discovered.len());
        for league in discovered {
            let record = YahooLeague {
                user_id: user_id.to_owned(),
                league_key: league.league_key,
                season_year: league.season_year,
                sport: league.sport,
                league_name: league.league_name,
                team_key: None,
                team_name: None,
            };

            if let Err(e) = self.database.upsert_yahoo_league(&record).await {
                tracing::warn!(
                    user_id = %user_id,
                    league_key = %record.league_key,
                    "Failed to save Yahoo league: {e}"
                );
                continue;
            }
            saved.push(record);
        }

        Ok(saved)
    }
}
