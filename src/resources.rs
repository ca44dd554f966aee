// ABOUTME: Shared server resources bundle injected into every route handler
// ABOUTME: Builds the authenticator, OAuth server, connectors, and rate limiter once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::auth::jwks::JwksCache;
use crate::auth::{AuthResult, AuthType, RequestAuthenticator};
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::discovery::LeagueDiscoveryEngine;
use crate::errors::{AppError, AppResult};
use crate::oauth2::OAuth2AuthorizationServer;
use crate::providers::espn::EspnClient;
use crate::providers::sleeper::{SleeperClient, SleeperConnector};
use crate::providers::yahoo::{YahooError, YahooManager, YahooOAuthClient};
use crate::rate_limiting::DailyRateLimiter;
use axum::http::HeaderMap;
use std::sync::Arc;

/// Dependency bundle shared by all HTTP handlers
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Database handle
    pub database: Database,
    /// Shared outbound HTTP client
    pub http: reqwest::Client,
    /// Multi-mode request authenticator
    pub authenticator: RequestAuthenticator,
    /// OAuth 2.1 authorization server
    pub oauth2: OAuth2AuthorizationServer,
    /// Daily raw-credential rate limiter
    pub rate_limiter: DailyRateLimiter,
}

impl ServerResources {
    /// Assemble the resource bundle
    #[must_use]
    pub fn new(config: ServerConfig, database: Database) -> Self {
        let config = Arc::new(config);
        let http = reqwest::Client::new();
        let jwks = Arc::new(JwksCache::new(http.clone(), config.environment));

        let authenticator =
            RequestAuthenticator::new(config.clone(), database.clone(), jwks);
        let oauth2 = OAuth2AuthorizationServer::new(database.clone(), config.clone());
        let rate_limiter = DailyRateLimiter::new(database.clone());

        Self {
            config,
            database,
            http,
            authenticator,
            oauth2,
            rate_limiter,
        }
    }

    /// Authenticate accepting any bearer mode (IdP, eval key, OAuth token)
    ///
    /// # Errors
    ///
    /// Returns the authenticator's 401 cause when no mode accepts the bearer.
    pub async fn authenticate_any(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        self.authenticator.authenticate(headers, None, true).await
    }

    /// Authenticate requiring an identity-provider JWT
    ///
    /// # Errors
    ///
    /// Returns a 401 when the bearer is missing, invalid, or not an IdP JWT.
    pub async fn authenticate_idp(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let result = self.authenticator.authenticate(headers, None, false).await?;
        if result.auth_type != AuthType::Idp {
            return Err(AppError::auth_invalid(
                "This endpoint requires identity-provider authentication",
            ));
        }
        Ok(result)
    }

    /// Build the ESPN discovery engine
    #[must_use]
    pub fn discovery_engine(&self) -> LeagueDiscoveryEngine {
        LeagueDiscoveryEngine::new(EspnClient::new(self.http.clone()), self.database.clone())
    }

    /// Build the Sleeper connector
    #[must_use]
    pub fn sleeper_connector(&self) -> SleeperConnector {
        SleeperConnector::new(SleeperClient::new(self.http.clone()), self.database.clone())
    }

    /// Build the Yahoo manager
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when Yahoo client credentials are absent.
    pub fn yahoo_manager(&self) -> Result<YahooManager, YahooError> {
        let oauth = YahooOAuthClient::from_config(&self.config.yahoo, self.http.clone())?;
        Ok(YahooManager::new(self.database.clone(), oauth))
    }
}
