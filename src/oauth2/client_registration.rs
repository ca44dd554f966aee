// ABOUTME: OAuth 2.0 dynamic client registration implementation (RFC 7591)
// ABOUTME: Registers MCP clients as public clients with mcp_-prefixed identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::models::{ClientRegistrationRequest, ClientRegistrationResponse, OAuth2Error};
use crate::database::Database;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use ring::rand::{SecureRandom, SystemRandom};

/// OAuth 2.0 Client Registration Manager
pub struct ClientRegistrationManager {
    database: Database,
}

impl ClientRegistrationManager {
    /// Creates a new client registration manager
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Register a new OAuth 2.0 client (RFC 7591)
    ///
    /// MCP clients are public clients (RFC 8252): no client secret is issued
    /// and the token endpoint relies on PKCE instead.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or storage fails.
    pub async fn register_client(
        &self,
        request: ClientRegistrationRequest,
    ) -> Result<ClientRegistrationResponse, OAuth2Error> {
        Self::validate_registration_request(&request)?;

        let client_id = Self::generate_client_id()?;
        let created_at = Utc::now();

        self.database
            .store_oauth_client(
                &client_id,
                request.client_name.as_deref(),
                &request.redirect_uris,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, client_id = %client_id, "Failed to store client registration");
                OAuth2Error::invalid_request("Failed to store client registration")
            })?;

        tracing::info!(client_id = %client_id, "Registered OAuth client");

        Ok(ClientRegistrationResponse {
            client_id,
            client_id_issued_at: created_at.timestamp(),
            redirect_uris: request.redirect_uris,
            grant_types: vec!["authorization_code".to_owned(), "refresh_token".to_owned()],
            response_types: vec!["code".to_owned()],
            token_endpoint_auth_method: "none".to_owned(),
            client_name: request.client_name,
        })
    }

    fn validate_registration_request(
        request: &ClientRegistrationRequest,
    ) -> Result<(), OAuth2Error> {
        if request.redirect_uris.is_empty() {
            return Err(OAuth2Error::invalid_request(
                "At least one redirect_uri is required",
            ));
        }

        for uri in &request.redirect_uris {
            if uri.trim().is_empty() || uri.contains('#') || uri.contains('*') {
                return Err(OAuth2Error::invalid_request(&format!(
                    "Invalid redirect_uri: {uri}"
                )));
            }
        }

        Ok(())
    }

    /// Generate a globally unique `mcp_`-prefixed client id
    ///
    /// # Errors
    ///
    /// Returns an error if the system RNG fails; the server cannot mint
    /// identifiers securely without working RNG.
    fn generate_client_id() -> Result<String, OAuth2Error> {
        let rng = SystemRandom::new();
        let mut bytes = [0u8; 32];
        rng.fill(&mut bytes).map_err(|e| {
            tracing::error!("System RNG failure generating client id: {e}");
            OAuth2Error::invalid_request("Failed to generate client identifier")
        })?;

        Ok(format!("mcp_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }
}
