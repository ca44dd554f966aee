// ABOUTME: Multi-mode request authenticator resolving bearer credentials to user principals
// ABOUTME: Tries IdP JWT, then the eval API key, then opaque OAuth access tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Request authentication
//!
//! A single bearer parse feeds an ordered pipeline of strategies. IdP
//! verification failures are expected during fallthrough and logged at debug
//! level only. The eval API key is compared in constant time over SHA-256
//! digests, and the OAuth strategy validates opaque tokens against storage
//! with optional RFC 8707 resource matching.

/// Identity-provider JWT verification
pub mod idp;
/// Per-issuer JWKS cache
pub mod jwks;

use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use axum::http::HeaderMap;
use chrono::Utc;
use jwks::JwksCache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// How the request was authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// Identity-provider JWT
    Idp,
    /// Opaque OAuth access token minted by this service
    OAuth,
    /// Static eval API key
    Eval,
}

impl AuthType {
    /// Wire name of the authentication mode
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idp => "idp",
            Self::OAuth => "oauth",
            Self::Eval => "eval",
        }
    }
}

/// Resolved principal for an authenticated request
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// User principal (opaque IdP subject)
    pub user_id: String,
    /// Authentication mode that succeeded
    pub auth_type: AuthType,
    /// Scope carried by the credential, when applicable
    pub scope: Option<String>,
}

/// Multi-mode request authenticator
pub struct RequestAuthenticator {
    config: Arc<ServerConfig>,
    database: Database,
    jwks: Arc<JwksCache>,
}

impl RequestAuthenticator {
    /// Create a new authenticator
    #[must_use]
    pub const fn new(config: Arc<ServerConfig>, database: Database, jwks: Arc<JwksCache>) -> Self {
        Self {
            config,
            database,
            jwks,
        }
    }

    /// Extract the bearer token from the Authorization header
    #[must_use]
    pub fn parse_bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(std::borrow::ToOwned::to_owned)
    }

    /// Authenticate a request against all allowed bearer modes
    ///
    /// Strategies run in order: IdP JWT, eval API key (when allowed), OAuth
    /// access token. A valid IdP JWT that happens to equal the eval key
    /// resolves as IdP because the JWT strategy runs first.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when no strategy accepts the bearer, or
    /// `ResourceNotAllowed` when the eval key matched but the expected
    /// resource is outside the eval allowlist.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        expected_resource: Option<&str>,
        allow_eval_api_key: bool,
    ) -> AppResult<AuthResult> {
        let Some(token) = Self::parse_bearer(headers) else {
            return Err(AppError::auth_required());
        };

        match idp::verify_idp_jwt(&token, &self.config, &self.jwks).await {
            Ok(user_id) => {
                return Ok(AuthResult {
                    user_id,
                    auth_type: AuthType::Idp,
                    scope: None,
                });
            }
            Err(e) => {
                // Expected for non-JWT bearers; fall through to other modes
                tracing::debug!("IdP JWT verification did not apply: {e}");
            }
        }

        if allow_eval_api_key {
            if let Some(result) = self.try_eval_api_key(&token, expected_resource)? {
                return Ok(result);
            }
        }

        match self.validate_oauth_token(&token, expected_resource).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::debug!("OAuth token validation failed: {e}");
                Err(AppError::auth_required())
            }
        }
    }

    /// Try the static eval API key strategy
    ///
    /// Returns `Ok(None)` when the key is not configured or does not match,
    /// so the pipeline can continue.
    fn try_eval_api_key(
        &self,
        token: &str,
        expected_resource: Option<&str>,
    ) -> AppResult<Option<AuthResult>> {
        let Some(configured) = self.config.eval.api_key.as_deref() else {
            return Ok(None);
        };

        let token_digest = Sha256::digest(token.as_bytes());
        let key_digest = Sha256::digest(configured.as_bytes());
        if !bool::from(token_digest.as_slice().ct_eq(key_digest.as_slice())) {
            return Ok(None);
        }

        let Some(user_id) = self.config.eval.user_id.clone() else {
            tracing::warn!("EVAL_API_KEY is set but EVAL_USER_ID is not; skipping eval auth");
            return Ok(None);
        };

        if let Some(resource) = expected_resource {
            let allowed = self.config.eval_allowed_resources();
            if !allowed.iter().any(|r| r == resource) {
                return Err(AppError::new(
                    ErrorCode::ResourceNotAllowed,
                    "Resource not allowed for API key",
                ));
            }
        }

        Ok(Some(AuthResult {
            user_id,
            auth_type: AuthType::Eval,
            scope: Some("mcp:read".into()),
        }))
    }

    /// Validate an opaque OAuth access token against storage
    ///
    /// Rejects revoked and expired tokens. When the token was minted with a
    /// resource indicator and the caller supplies an expected resource, the
    /// two must match exactly; tokens minted without a resource are accepted
    /// against any expectation for backwards compatibility.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` when the token is unknown, revoked, expired, or
    /// bound to a different resource.
    pub async fn validate_oauth_token(
        &self,
        token: &str,
        expected_resource: Option<&str>,
    ) -> AppResult<AuthResult> {
        let record = self
            .database
            .get_oauth_token(token)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Unknown access token"))?;

        if record.revoked_at.is_some() {
            return Err(AppError::auth_invalid("Access token has been revoked"));
        }
        if record.expires_at <= Utc::now() {
            return Err(AppError::auth_invalid("Access token has expired"));
        }

        if let (Some(bound), Some(expected)) = (record.resource.as_deref(), expected_resource) {
            if bound != expected {
                return Err(AppError::auth_invalid(
                    "Access token is bound to a different resource",
                ));
            }
        }

        Ok(AuthResult {
            user_id: record.user_id,
            auth_type: AuthType::OAuth,
            scope: Some(record.scope),
        })
    }
}
