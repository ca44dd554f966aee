// ABOUTME: Environment-based configuration for the auth worker
// ABOUTME: Loads server, identity-provider, Yahoo OAuth, and CORS settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Server configuration loaded entirely from environment variables.
//!
//! `ServerConfig::from_env()` is the single entry point; every setting has an
//! environment-appropriate default except the database URL and the Yahoo
//! client credentials, which are optional until their flows are exercised.

use crate::errors::{AppError, AppResult};
use std::env;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production deployment behind `api.flaim.app`
    Production,
    /// Preview deployment (adds the `/auth-preview` mount)
    Preview,
    /// Local development
    Development,
}

impl Environment {
    /// Parse from the `ENVIRONMENT` variable, defaulting to development
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT").as_deref() {
            Ok("production") => Self::Production,
            Ok("preview") => Self::Preview,
            _ => Self::Development,
        }
    }

    /// True for production deployments
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Identity-provider (IdP) verification settings
#[derive(Debug, Clone)]
pub struct IdpConfig {
    /// Issuer configured for this deployment
    pub issuer: String,
}

/// Fixed production issuer accepted in every environment
pub const PRODUCTION_ISSUER: &str = "https://clerk.flaim.app";

/// Host suffix accepted for development IdP instances outside production
pub const DEV_ISSUER_HOST_SUFFIX: &str = ".clerk.accounts.dev";

/// Eval harness credentials (optional static API key)
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Static API key accepted by the authenticator when allowed
    pub api_key: Option<String>,
    /// User principal the eval key resolves to
    pub user_id: Option<String>,
}

/// Yahoo OAuth application credentials
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Yahoo application client id
    pub client_id: Option<String>,
    /// Yahoo application client secret
    pub client_secret: Option<String>,
    /// Redirect URI registered with Yahoo
    pub redirect_uri: String,
}

impl YahooConfig {
    /// True when both client credentials are configured
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// HTTP listen port
    pub http_port: u16,
    /// Postgres connection string
    pub database_url: String,
    /// Public base URL of this service (no trailing slash)
    pub base_url: String,
    /// Frontend base URL used for consent and callback redirects (no trailing slash)
    pub frontend_url: String,
    /// IdP verification settings
    pub idp: IdpConfig,
    /// Eval harness credentials
    pub eval: EvalConfig,
    /// Yahoo OAuth application
    pub yahoo: YahooConfig,
    /// CORS origin allowlist (entries may carry `*` wildcards)
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or `HTTP_PORT` is not a
    /// valid port number.
    pub fn from_env() -> AppResult<Self> {
        let environment = Environment::from_env();

        let http_port = env::var("HTTP_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "8787".into())
            .parse::<u16>()
            .map_err(|e| AppError::config(format!("Invalid HTTP_PORT: {e}")))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::config("DATABASE_URL is required"))?;

        let base_url = strip_trailing_slash(&env::var("BASE_URL").unwrap_or_else(|_| {
            if environment.is_production() {
                "https://api.flaim.app".into()
            } else {
                format!("http://localhost:{http_port}")
            }
        }));

        let frontend_url =
            strip_trailing_slash(&env::var("FRONTEND_URL").unwrap_or_else(|_| {
                if environment.is_production() {
                    "https://flaim.app".into()
                } else {
                    "http://localhost:3000".into()
                }
            }));

        let idp = IdpConfig {
            issuer: env::var("IDP_ISSUER").unwrap_or_else(|_| PRODUCTION_ISSUER.into()),
        };

        let eval = EvalConfig {
            api_key: env::var("EVAL_API_KEY").ok().filter(|v| !v.is_empty()),
            user_id: env::var("EVAL_USER_ID").ok().filter(|v| !v.is_empty()),
        };

        let yahoo = YahooConfig {
            client_id: env::var("YAHOO_CLIENT_ID").ok().filter(|v| !v.is_empty()),
            client_secret: env::var("YAHOO_CLIENT_SECRET")
                .ok()
                .filter(|v| !v.is_empty()),
            redirect_uri: env::var("YAHOO_REDIRECT_URI")
                .unwrap_or_else(|_| format!("{base_url}/connect/yahoo/callback")),
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| default_cors_origins(environment))
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            environment,
            http_port,
            database_url,
            base_url,
            frontend_url,
            idp,
            eval,
            yahoo,
            cors_allowed_origins,
        })
    }

    /// Resources an eval API key is allowed to introspect against
    #[must_use]
    pub fn eval_allowed_resources(&self) -> [String; 2] {
        [
            format!("{}/mcp", self.base_url),
            format!("{}/fantasy/mcp", self.base_url),
        ]
    }

    /// Consent page URL the authorize endpoint redirects to
    #[must_use]
    pub fn consent_url(&self) -> String {
        format!("{}/oauth/consent", self.frontend_url)
    }
}

fn default_cors_origins(environment: Environment) -> String {
    if environment.is_production() {
        "https://flaim.app,https://*.flaim.app,https://claude.ai,https://chatgpt.com".into()
    } else {
        "http://localhost:3000,https://claude.ai,https://chatgpt.com".into()
    }
}

fn strip_trailing_slash(url: &str) -> String {
    url.trim_end_matches('/').to_owned()
}
