// ABOUTME: OAuth 2.1 data models for client registration and token exchange
// ABOUTME: Implements RFC 7591 and OAuth 2.0 request/response structures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OAuth 2.0 Client Registration Request (RFC 7591)
#[derive(Debug, Deserialize)]
pub struct ClientRegistrationRequest {
    /// Redirect URIs for authorization code flow
    pub redirect_uris: Vec<String>,
    /// Optional client name for display
    pub client_name: Option<String>,
}

/// OAuth 2.0 Client Registration Response (RFC 7591)
#[derive(Debug, Serialize)]
pub struct ClientRegistrationResponse {
    /// Unique client identifier
    pub client_id: String,
    /// When the client id was issued (unix seconds)
    pub client_id_issued_at: i64,
    /// Redirect URIs registered for this client
    pub redirect_uris: Vec<String>,
    /// Grant types allowed for this client
    pub grant_types: Vec<String>,
    /// Response types allowed for this client
    pub response_types: Vec<String>,
    /// Endpoint auth method; always `none` (public clients)
    pub token_endpoint_auth_method: String,
    /// Client name, when supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

/// Code-mint request body (`POST /oauth/code`)
#[derive(Debug, Deserialize)]
pub struct MintCodeRequest {
    /// Client callback the code will be exchanged from
    pub redirect_uri: String,
    /// Requested scope
    pub scope: Option<String>,
    /// Client CSRF state echoed in the redirect URL
    pub state: Option<String>,
    /// PKCE code challenge
    pub code_challenge: String,
    /// PKCE challenge method (`S256`)
    pub code_challenge_method: Option<String>,
    /// RFC 8707 resource indicator
    pub resource: Option<String>,
}

/// Code-mint response body
#[derive(Debug, Serialize)]
pub struct MintCodeResponse {
    /// Always true on success
    pub success: bool,
    /// The authorization code
    pub code: String,
    /// Client callback with `code` (and `state`) appended
    pub redirect_url: String,
}

/// OAuth 2.0 Token Request, parsed from form or JSON bodies
#[derive(Debug, Default)]
pub struct TokenRequest {
    /// Grant type (`authorization_code`, `refresh_token`)
    pub grant_type: String,
    /// Authorization code (for `authorization_code` grant)
    pub code: Option<String>,
    /// Redirect URI (must match the code's binding byte-for-byte)
    pub redirect_uri: Option<String>,
    /// PKCE code verifier
    pub code_verifier: Option<String>,
    /// Refresh token (for `refresh_token` grant)
    pub refresh_token: Option<String>,
}

impl TokenRequest {
    /// Build from a decoded parameter map (shared by form and JSON bodies)
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` when `grant_type` is missing.
    pub fn from_params(mut params: HashMap<String, String>) -> Result<Self, OAuth2Error> {
        let grant_type = params
            .remove("grant_type")
            .ok_or_else(|| OAuth2Error::invalid_request("Missing grant_type parameter"))?;

        Ok(Self {
            grant_type,
            code: params.remove("code"),
            redirect_uri: params.remove("redirect_uri"),
            code_verifier: params.remove("code_verifier"),
            refresh_token: params.remove("refresh_token"),
        })
    }
}

/// OAuth 2.0 Token Response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Access token value
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    /// Scope granted
    pub scope: String,
    /// Refresh token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// OAuth 2.0 Error Response
#[derive(Debug, Clone, Serialize)]
pub struct OAuth2Error {
    /// Error code
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuth2Error {
    /// Create an `invalid_request` error
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self {
            error: "invalid_request".to_owned(),
            error_description: Some(description.to_owned()),
        }
    }

    /// Create an `invalid_grant` error
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self {
            error: "invalid_grant".to_owned(),
            error_description: Some(description.to_owned()),
        }
    }

    /// Create an `unsupported_response_type` error
    #[must_use]
    pub fn unsupported_response_type() -> Self {
        Self {
            error: "unsupported_response_type".to_owned(),
            error_description: Some("Only the 'code' response_type is supported".to_owned()),
        }
    }

    /// Create an `unsupported_grant_type` error
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self {
            error: "unsupported_grant_type".to_owned(),
            error_description: Some("Grant type not supported".to_owned()),
        }
    }
}

/// Outcome of the authorization endpoint's parameter validation
#[derive(Debug)]
pub enum AuthorizeOutcome {
    /// 302 to the consent page with all parameters forwarded
    Consent(String),
    /// 302 back to the client callback with OAuth error parameters
    ErrorRedirect(String),
    /// 400 JSON (redirect URI missing or not trustworthy)
    BadRequest(OAuth2Error),
}
