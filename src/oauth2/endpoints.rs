// ABOUTME: OAuth 2.1 authorization and token endpoint implementation
// ABOUTME: Mints single-use PKCE-bound codes and opaque access/refresh token pairs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::models::{
    AuthorizeOutcome, MintCodeRequest, MintCodeResponse, OAuth2Error, TokenRequest, TokenResponse,
};
use super::policy;
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::models::{OAuthCode, OAuthState, OAuthToken};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Authorization-code lifetime
const CODE_TTL_MINUTES: i64 = 10;
/// Access-token lifetime
const ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;
/// Refresh-token lifetime
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Default scope granted when a code is minted without one
const DEFAULT_SCOPE: &str = "mcp:read mcp:write";

/// Verify a PKCE code verifier against a stored challenge
///
/// `S256` compares `base64url(SHA-256(verifier))` to the challenge in
/// constant time. A stored `plain` method (possible only on records minted
/// before S256 became mandatory) compares the verifier directly.
#[must_use]
pub fn verify_pkce(verifier: &str, challenge: &str, method: &str) -> bool {
    if method == "plain" {
        return bool::from(verifier.as_bytes().ct_eq(challenge.as_bytes()));
    }

    let digest = Sha256::digest(verifier.as_bytes());
    let computed = URL_SAFE_NO_PAD.encode(digest);
    bool::from(computed.as_bytes().ct_eq(challenge.as_bytes()))
}

/// Authorization-server metadata document (RFC 8414)
#[must_use]
pub fn authorization_server_metadata(config: &ServerConfig) -> serde_json::Value {
    let base = &config.base_url;
    json!({
        "issuer": base,
        "authorization_endpoint": format!("{base}/authorize"),
        "token_endpoint": format!("{base}/token"),
        "registration_endpoint": format!("{base}/register"),
        "revocation_endpoint": format!("{base}/revoke"),
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "response_types_supported": ["code"],
        "token_endpoint_auth_methods_supported": ["none", "client_secret_post"],
        "scopes_supported": ["mcp:read", "mcp:write"],
        "code_challenge_methods_supported": ["S256"],
    })
}

/// Protected-resource metadata document (RFC 9728)
///
/// `suffix` selects which protected resource is described; it defaults to
/// the MCP endpoint.
#[must_use]
pub fn protected_resource_metadata(config: &ServerConfig, suffix: Option<&str>) -> serde_json::Value {
    let base = &config.base_url;
    let suffix = suffix.unwrap_or("/mcp");
    json!({
        "resource": format!("{base}{suffix}"),
        "authorization_servers": [base],
        "bearer_methods_supported": ["header"],
        "scopes_supported": ["mcp:read", "mcp:write"],
    })
}

fn error_redirect(redirect_uri: &str, error: &OAuth2Error, state: Option<&str>) -> String {
    let mut url = format!("{}?error={}", redirect_uri, urlencoding::encode(&error.error));
    if let Some(description) = &error.error_description {
        write!(&mut url, "&error_description={}", urlencoding::encode(description)).ok();
    }
    if let Some(state) = state {
        write!(&mut url, "&state={}", urlencoding::encode(state)).ok();
    }
    url
}

/// OAuth 2.1 Authorization Server
pub struct OAuth2AuthorizationServer {
    database: Database,
    config: Arc<ServerConfig>,
}

impl OAuth2AuthorizationServer {
    /// Create the authorization server
    #[must_use]
    pub const fn new(database: Database, config: Arc<ServerConfig>) -> Self {
        Self { database, config }
    }

    /// Validate an authorization request (GET /authorize)
    ///
    /// The redirect URI is validated first: until it is known to be
    /// trustworthy, errors are returned as 400 JSON rather than redirects.
    /// After that, protocol errors redirect back to the client per RFC 6749.
    #[must_use]
    pub fn authorize(&self, params: &HashMap<String, String>) -> AuthorizeOutcome {
        let Some(redirect_uri) = params.get("redirect_uri") else {
            return AuthorizeOutcome::BadRequest(OAuth2Error::invalid_request(
                "redirect_uri is required",
            ));
        };

        if !policy::is_valid_redirect_uri(redirect_uri) {
            tracing::warn!(redirect_uri = %redirect_uri, "Rejected unknown redirect_uri");
            return AuthorizeOutcome::BadRequest(OAuth2Error::invalid_request(
                "Invalid redirect_uri",
            ));
        }

        let state = params.get("state").map(String::as_str);

        if params.get("response_type").map(String::as_str) != Some("code") {
            return AuthorizeOutcome::ErrorRedirect(error_redirect(
                redirect_uri,
                &OAuth2Error::unsupported_response_type(),
                state,
            ));
        }

        // PKCE is mandatory (OAuth 2.1); plain is rejected outright
        if !params.contains_key("code_challenge") {
            return AuthorizeOutcome::ErrorRedirect(error_redirect(
                redirect_uri,
                &OAuth2Error::invalid_request("code_challenge is required (PKCE)"),
                state,
            ));
        }

        let method = params
            .get("code_challenge_method")
            .map_or("S256", String::as_str);
        if method != "S256" {
            return AuthorizeOutcome::ErrorRedirect(error_redirect(
                redirect_uri,
                &OAuth2Error::invalid_request("code_challenge_method must be S256"),
                state,
            ));
        }

        // Forward all OAuth parameters to the consent page
        let mut consent = self.config.consent_url();
        let mut first = true;
        for (key, value) in params {
            let separator = if first { '?' } else { '&' };
            first = false;
            write!(
                &mut consent,
                "{separator}{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
            .ok();
        }

        AuthorizeOutcome::Consent(consent)
    }

    /// Mint an authorization code for an authenticated principal (POST /oauth/code)
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` when the redirect URI fails policy or code
    /// generation/storage fails.
    pub async fn mint_code(
        &self,
        user_id: &str,
        request: MintCodeRequest,
    ) -> Result<MintCodeResponse, OAuth2Error> {
        if !policy::is_valid_redirect_uri(&request.redirect_uri) {
            return Err(OAuth2Error::invalid_request("Invalid redirect_uri"));
        }

        let code = generate_token_value()?;
        let now = Utc::now();

        let record = OAuthCode {
            code: code.clone(),
            user_id: user_id.to_owned(),
            redirect_uri: request.redirect_uri.clone(),
            scope: request.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_owned()),
            resource: request.resource,
            state: request.state.clone(),
            code_challenge: Some(request.code_challenge),
            code_challenge_method: Some(
                request.code_challenge_method.unwrap_or_else(|| "S256".to_owned()),
            ),
            expires_at: now + Duration::minutes(CODE_TTL_MINUTES),
            used_at: None,
            created_at: now,
        };

        self.database.store_oauth_code(&record).await.map_err(|e| {
            tracing::error!(user_id = %user_id, "Failed to store authorization code: {e}");
            OAuth2Error::invalid_request("Failed to generate authorization code")
        })?;

        // Server-side copy of the client's CSRF state; consumed exactly once
        // during the exchange
        if let Some(state) = &request.state {
            let state_record = OAuthState {
                state: state.clone(),
                user_id: Some(user_id.to_owned()),
                client_id: None,
                redirect_uri: Some(request.redirect_uri.clone()),
                expires_at: record.expires_at,
            };
            self.database
                .store_oauth_state(&state_record)
                .await
                .map_err(|e| {
                    tracing::error!(user_id = %user_id, "Failed to store OAuth state: {e}");
                    OAuth2Error::invalid_request("Failed to generate authorization code")
                })?;
        }

        let mut redirect_url = format!(
            "{}?code={}",
            request.redirect_uri,
            urlencoding::encode(&code)
        );
        if let Some(state) = &request.state {
            write!(&mut redirect_url, "&state={}", urlencoding::encode(state)).ok();
        }

        tracing::info!(user_id = %user_id, "Minted authorization code");

        Ok(MintCodeResponse {
            success: true,
            code,
            redirect_url,
        })
    }

    /// Handle a token request (POST /token)
    ///
    /// # Errors
    ///
    /// Returns the RFC 6749 error strings: `invalid_request` for missing
    /// parameters, `invalid_grant` for unusable codes/verifiers/refresh
    /// tokens, and `unsupported_grant_type` for anything else.
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        match request.grant_type.as_str() {
            "authorization_code" => self.handle_authorization_code_grant(request).await,
            "refresh_token" => self.handle_refresh_token_grant(request).await,
            _ => Err(OAuth2Error::unsupported_grant_type()),
        }
    }

    async fn handle_authorization_code_grant(
        &self,
        request: TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        let code = request
            .code
            .ok_or_else(|| OAuth2Error::invalid_request("Missing authorization code"))?;
        let redirect_uri = request
            .redirect_uri
            .ok_or_else(|| OAuth2Error::invalid_request("Missing redirect_uri"))?;

        // Atomic consumption: the conditional update requires a byte-exact
        // redirect_uri match and flips used_at exactly once, so a replayed
        // code can never produce a second token.
        let auth_code = self
            .database
            .consume_oauth_code(&code, &redirect_uri, Utc::now())
            .await
            .map_err(|e| {
                tracing::error!("Failed to consume authorization code: {e}");
                OAuth2Error::invalid_grant("Failed to consume authorization code")
            })?
            .ok_or_else(|| {
                tracing::warn!("Authorization code rejected: unknown, used, expired, or redirect mismatch");
                OAuth2Error::invalid_grant("Invalid or expired authorization code")
            })?;

        // The state copy stored at mint time is consumed here; the row is
        // removed whether valid or not, so a state can never be replayed.
        if let Some(state) = &auth_code.state {
            let consumed = self
                .database
                .consume_oauth_state(state, Utc::now())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to consume OAuth state: {e}");
                    OAuth2Error::invalid_grant("Failed to validate state parameter")
                })?;
            if consumed.is_none() {
                tracing::warn!("OAuth state missing, expired, or already consumed");
                return Err(OAuth2Error::invalid_grant("Invalid state parameter"));
            }
        }

        // PKCE verification happens after consumption so a failed verifier
        // still burns the code.
        if let Some(challenge) = &auth_code.code_challenge {
            let verifier = request
                .code_verifier
                .as_deref()
                .ok_or_else(|| OAuth2Error::invalid_grant("code_verifier is required (PKCE)"))?;

            let method = auth_code.code_challenge_method.as_deref().unwrap_or("S256");
            if !verify_pkce(verifier, challenge, method) {
                tracing::warn!(user_id = %auth_code.user_id, "PKCE verification failed");
                return Err(OAuth2Error::invalid_grant("Invalid code_verifier"));
            }
        }

        let client_name = policy::derive_client_name(&auth_code.redirect_uri);
        let token = self
            .mint_token_pair(
                &auth_code.user_id,
                &auth_code.scope,
                auth_code.resource.as_deref(),
                &client_name,
            )
            .await?;

        tracing::info!(
            user_id = %auth_code.user_id,
            client = %client_name,
            "Issued access token via authorization_code grant"
        );

        Ok(token)
    }

    async fn handle_refresh_token_grant(
        &self,
        request: TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        let refresh_token = request
            .refresh_token
            .ok_or_else(|| OAuth2Error::invalid_request("Missing refresh_token"))?;

        let old = self
            .database
            .get_oauth_token_by_refresh(&refresh_token)
            .await
            .map_err(|e| {
                tracing::error!("Refresh token lookup failed: {e}");
                OAuth2Error::invalid_grant("Failed to look up refresh token")
            })?
            .ok_or_else(|| OAuth2Error::invalid_grant("Unknown refresh token"))?;

        if old.revoked_at.is_some() {
            return Err(OAuth2Error::invalid_grant("Refresh token has been revoked"));
        }
        if old
            .refresh_token_expires_at
            .is_none_or(|expires| expires <= Utc::now())
        {
            return Err(OAuth2Error::invalid_grant("Refresh token has expired"));
        }

        // Rotation: the old access token (and its refresh token) die here
        self.database
            .revoke_oauth_token(&old.access_token)
            .await
            .map_err(|e| {
                tracing::error!("Failed to revoke rotated token: {e}");
                OAuth2Error::invalid_grant("Failed to rotate refresh token")
            })?;

        let token = self
            .mint_token_pair(
                &old.user_id,
                &old.scope,
                old.resource.as_deref(),
                &old.client_name,
            )
            .await?;

        tracing::info!(user_id = %old.user_id, "Rotated refresh token");

        Ok(token)
    }

    async fn mint_token_pair(
        &self,
        user_id: &str,
        scope: &str,
        resource: Option<&str>,
        client_name: &str,
    ) -> Result<TokenResponse, OAuth2Error> {
        let access_token = generate_token_value()?;
        let refresh_token = generate_token_value()?;
        let now = Utc::now();

        let record = OAuthToken {
            access_token: access_token.clone(),
            user_id: user_id.to_owned(),
            scope: scope.to_owned(),
            resource: resource.map(std::borrow::ToOwned::to_owned),
            client_name: client_name.to_owned(),
            expires_at: now + Duration::seconds(ACCESS_TOKEN_TTL_SECONDS),
            revoked_at: None,
            refresh_token: Some(refresh_token.clone()),
            refresh_token_expires_at: Some(now + Duration::days(REFRESH_TOKEN_TTL_DAYS)),
            created_at: now,
        };

        self.database.store_oauth_token(&record).await.map_err(|e| {
            tracing::error!(user_id = %user_id, "Failed to store access token: {e}");
            OAuth2Error::invalid_grant("Failed to store access token")
        })?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_owned(),
            expires_in: ACCESS_TOKEN_TTL_SECONDS,
            scope: scope.to_owned(),
            refresh_token: Some(refresh_token),
        })
    }
}

/// Generate a random URL-safe token (32 bytes of entropy)
///
/// # Errors
///
/// Returns an error if the system RNG fails; tokens must never be minted
/// from weak randomness.
fn generate_token_value() -> Result<String, OAuth2Error> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!("System RNG failure generating token: {e}");
        OAuth2Error::invalid_request("Failed to generate secure token")
    })?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
