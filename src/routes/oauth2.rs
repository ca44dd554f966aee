// ABOUTME: OAuth 2.1 HTTP route handlers: metadata, registration, authorize, token, revocation
// ABOUTME: Maps authorization-server outcomes onto RFC-shaped responses and redirects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::AppError;
use crate::oauth2::client_registration::ClientRegistrationManager;
use crate::oauth2::endpoints::{authorization_server_metadata, protected_resource_metadata};
use crate::oauth2::models::{AuthorizeOutcome, ClientRegistrationRequest, MintCodeRequest};
use crate::oauth2::{OAuth2Error, TokenRequest};
use crate::resources::ServerResources;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

const METADATA_CACHE_CONTROL: &str = "public, max-age=3600";

/// OAuth 2.1 routes
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create all OAuth 2.1 routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/.well-known/oauth-authorization-server",
                get(Self::handle_authorization_server_metadata),
            )
            .route(
                "/.well-known/oauth-authorization-server/*rest",
                get(Self::handle_authorization_server_metadata),
            )
            .route(
                "/.well-known/oauth-protected-resource",
                get(Self::handle_protected_resource_metadata_root),
            )
            .route(
                "/.well-known/oauth-protected-resource/*suffix",
                get(Self::handle_protected_resource_metadata),
            )
            .route("/register", post(Self::handle_register))
            .route("/authorize", get(Self::handle_authorize))
            .route("/oauth/code", post(Self::handle_mint_code))
            .route("/token", post(Self::handle_token))
            .route("/revoke", post(Self::handle_revoke))
            .route("/introspect", get(Self::handle_introspect))
            .route("/oauth/status", post(Self::handle_status))
            .route("/oauth/revoke", post(Self::handle_revoke_own))
            .route("/oauth/revoke-all", post(Self::handle_revoke_all))
            .with_state(resources)
    }

    /// GET /.well-known/oauth-authorization-server[/...]
    ///
    /// The suffixed form serves the same body as the root.
    async fn handle_authorization_server_metadata(
        State(resources): State<Arc<ServerResources>>,
    ) -> Response {
        let body = authorization_server_metadata(&resources.config);
        (
            [(header::CACHE_CONTROL, METADATA_CACHE_CONTROL)],
            Json(body),
        )
            .into_response()
    }

    /// GET /.well-known/oauth-protected-resource (suffix defaults to /mcp)
    async fn handle_protected_resource_metadata_root(
        State(resources): State<Arc<ServerResources>>,
    ) -> Response {
        let body = protected_resource_metadata(&resources.config, None);
        (
            [(header::CACHE_CONTROL, METADATA_CACHE_CONTROL)],
            Json(body),
        )
            .into_response()
    }

    /// GET /.well-known/oauth-protected-resource/:suffix
    async fn handle_protected_resource_metadata(
        State(resources): State<Arc<ServerResources>>,
        Path(suffix): Path<String>,
    ) -> Response {
        let suffix = format!("/{}", suffix.trim_start_matches('/'));
        let body = protected_resource_metadata(&resources.config, Some(&suffix));
        (
            [(header::CACHE_CONTROL, METADATA_CACHE_CONTROL)],
            Json(body),
        )
            .into_response()
    }

    /// POST /register (RFC 7591 dynamic client registration)
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ClientRegistrationRequest>,
    ) -> Response {
        let manager = ClientRegistrationManager::new(resources.database.clone());
        match manager.register_client(request).await {
            Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
            Err(error) => (StatusCode::BAD_REQUEST, Json(error)).into_response(),
        }
    }

    /// GET /authorize
    async fn handle_authorize(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        match resources.oauth2.authorize(&params) {
            AuthorizeOutcome::Consent(url) | AuthorizeOutcome::ErrorRedirect(url) => {
                redirect_found(&url)
            }
            AuthorizeOutcome::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
        }
    }

    /// POST /oauth/code (IdP-JWT-authenticated code minting)
    async fn handle_mint_code(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<MintCodeRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        match resources.oauth2.mint_code(&auth.user_id, request).await {
            Ok(response) => Ok((StatusCode::OK, Json(response)).into_response()),
            Err(error) => Ok((StatusCode::BAD_REQUEST, Json(error)).into_response()),
        }
    }

    /// POST /token (form-encoded or JSON)
    async fn handle_token(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let params = match parse_body_params(&headers, &body) {
            Ok(params) => params,
            Err(error) => return token_error_response(&error),
        };

        let request = match TokenRequest::from_params(params) {
            Ok(request) => request,
            Err(error) => return token_error_response(&error),
        };

        match resources.oauth2.token(request).await {
            Ok(response) => {
                let mut http_response = (StatusCode::OK, Json(response)).into_response();
                let response_headers = http_response.headers_mut();
                response_headers.insert(
                    header::CACHE_CONTROL,
                    header::HeaderValue::from_static("no-store"),
                );
                response_headers
                    .insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));
                http_response
            }
            Err(error) => token_error_response(&error),
        }
    }

    /// POST /revoke (RFC 7009: always 200)
    async fn handle_revoke(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let token = parse_body_params(&headers, &body)
            .ok()
            .and_then(|mut params| params.remove("token"));

        if let Some(token) = token {
            if let Err(e) = resources.database.revoke_oauth_token_by_value(&token).await {
                // Revocation still reports success; the token stays revocable
                tracing::error!("Token revocation write failed: {e}");
            }
        }

        (StatusCode::OK, Json(json!({}))).into_response()
    }

    /// GET /introspect (service-internal; eval API key allowed)
    async fn handle_introspect(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Response {
        let expected_resource = headers
            .get("x-flaim-expected-resource")
            .and_then(|value| value.to_str().ok());

        match resources
            .authenticator
            .authenticate(&headers, expected_resource, true)
            .await
        {
            Ok(auth) => (
                StatusCode::OK,
                Json(json!({
                    "valid": true,
                    "userId": auth.user_id,
                    "scope": auth.scope,
                })),
            )
                .into_response(),
            Err(error) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "valid": false,
                    "error": error.sanitized_message(),
                })),
            )
                .into_response(),
        }
    }

    /// POST /oauth/status (IdP-JWT-authenticated token inventory)
    async fn handle_status(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let tokens = resources
            .database
            .list_active_oauth_tokens(&auth.user_id, Utc::now())
            .await?;

        let connections: Vec<_> = tokens
            .iter()
            .map(|token| {
                json!({
                    "clientName": token.client_name,
                    "scope": token.scope,
                    "resource": token.resource,
                    "createdAt": token.created_at,
                    "expiresAt": token.expires_at,
                })
            })
            .collect();

        Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "count": connections.len(),
                "connections": connections,
            })),
        )
            .into_response())
    }

    /// POST /oauth/revoke (IdP-JWT-authenticated revoke of one own token)
    async fn handle_revoke_own(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let token = body
            .get("token")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| AppError::invalid_input("token is required"))?;

        // Only the owner may revoke through this endpoint
        let record = resources.database.get_oauth_token(token).await?;
        match record {
            Some(record) if record.user_id == auth.user_id => {
                resources.database.revoke_oauth_token(token).await?;
            }
            _ => {
                // Fall back to refresh-token match under the same ownership rule
                if let Some(record) =
                    resources.database.get_oauth_token_by_refresh(token).await?
                {
                    if record.user_id == auth.user_id {
                        resources
                            .database
                            .revoke_oauth_token(&record.access_token)
                            .await?;
                    }
                }
            }
        }

        Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
    }

    /// POST /oauth/revoke-all (IdP-JWT-authenticated)
    async fn handle_revoke_all(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.authenticate_idp(&headers).await?;

        let revoked = resources
            .database
            .revoke_all_oauth_tokens(&auth.user_id)
            .await?;

        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "revoked": revoked })),
        )
            .into_response())
    }
}

/// Parse a request body as form-encoded or JSON parameters
fn parse_body_params(
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<HashMap<String, String>, OAuth2Error> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if content_type.contains("application/json") {
        serde_json::from_slice::<HashMap<String, String>>(body)
            .map_err(|e| OAuth2Error::invalid_request(&format!("Invalid JSON body: {e}")))
    } else {
        Ok(url::form_urlencoded::parse(body)
            .into_owned()
            .collect::<HashMap<String, String>>())
    }
}

fn token_error_response(error: &OAuth2Error) -> Response {
    (StatusCode::BAD_REQUEST, Json(error.clone())).into_response()
}

pub(crate) fn redirect_found(location: &str) -> Response {
    match header::HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(e) => {
            tracing::error!("Unrepresentable redirect location: {e}");
            AppError::internal("Failed to build redirect").into_response()
        }
    }
}
