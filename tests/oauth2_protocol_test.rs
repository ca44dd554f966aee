// ABOUTME: Unit tests for OAuth 2.1 protocol logic: PKCE, authorize validation, metadata
// ABOUTME: Exercises the authorization server's pure paths with a never-connecting pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flaim_auth_worker::oauth2::endpoints::{
    authorization_server_metadata, protected_resource_metadata, verify_pkce,
};
use flaim_auth_worker::oauth2::models::AuthorizeOutcome;
use flaim_auth_worker::oauth2::{OAuth2AuthorizationServer, TokenRequest};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn test_server() -> OAuth2AuthorizationServer {
    OAuth2AuthorizationServer::new(common::lazy_database(), Arc::new(common::test_config()))
}

fn authorize_params(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn test_pkce_s256_binding() {
    let challenge = s256_challenge("verifier");
    assert!(verify_pkce("verifier", &challenge, "S256"));
    assert!(!verify_pkce("other-verifier", &challenge, "S256"));
    assert!(!verify_pkce("verifier", "tampered-challenge", "S256"));
}

#[test]
fn test_pkce_plain_compat_records() {
    assert!(verify_pkce("the-verifier", "the-verifier", "plain"));
    assert!(!verify_pkce("the-verifier", "different", "plain"));
}

#[test]
fn test_authorization_server_metadata_shape() {
    let metadata = authorization_server_metadata(&common::test_config());

    assert_eq!(
        metadata["code_challenge_methods_supported"],
        serde_json::json!(["S256"])
    );
    let grants = metadata["grant_types_supported"].as_array().unwrap();
    assert!(grants.contains(&serde_json::json!("authorization_code")));
    assert!(grants.contains(&serde_json::json!("refresh_token")));
    assert_eq!(metadata["response_types_supported"], serde_json::json!(["code"]));
    assert_eq!(
        metadata["token_endpoint_auth_methods_supported"],
        serde_json::json!(["none", "client_secret_post"])
    );
    assert_eq!(
        metadata["scopes_supported"],
        serde_json::json!(["mcp:read", "mcp:write"])
    );
}

#[test]
fn test_protected_resource_metadata_suffix() {
    let config = common::test_config();

    let default = protected_resource_metadata(&config, None);
    assert_eq!(default["resource"], "http://localhost:8787/mcp");

    let fantasy = protected_resource_metadata(&config, Some("/fantasy/mcp"));
    assert_eq!(fantasy["resource"], "http://localhost:8787/fantasy/mcp");
    assert_eq!(
        fantasy["authorization_servers"],
        serde_json::json!(["http://localhost:8787"])
    );
    assert_eq!(fantasy["bearer_methods_supported"], serde_json::json!(["header"]));
}

#[tokio::test]
async fn test_authorize_requires_redirect_uri() {
    let server = test_server();

    let outcome = server.authorize(&authorize_params(&[("response_type", "code")]));
    match outcome {
        AuthorizeOutcome::BadRequest(error) => assert_eq!(error.error, "invalid_request"),
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn test_authorize_rejects_unknown_redirect_uri() {
    let server = test_server();

    let outcome = server.authorize(&authorize_params(&[
        ("response_type", "code"),
        ("redirect_uri", "https://evil.com/callback"),
    ]));
    assert!(matches!(outcome, AuthorizeOutcome::BadRequest(_)));
}

#[tokio::test]
async fn test_authorize_rejects_non_code_response_type() {
    let server = test_server();

    let outcome = server.authorize(&authorize_params(&[
        ("response_type", "token"),
        ("client_id", "test"),
        ("redirect_uri", "https://claude.ai/api/mcp/auth_callback"),
        ("state", "abc"),
    ]));
    match outcome {
        AuthorizeOutcome::ErrorRedirect(url) => {
            assert!(url.starts_with("https://claude.ai/api/mcp/auth_callback?"));
            assert!(url.contains("error=unsupported_response_type"));
            assert!(url.contains("state=abc"));
        }
        other => panic!("expected ErrorRedirect, got {other:?}"),
    }
}

#[tokio::test]
async fn test_authorize_missing_pkce_redirects_with_error() {
    let server = test_server();

    let outcome = server.authorize(&authorize_params(&[
        ("response_type", "code"),
        ("client_id", "test"),
        ("redirect_uri", "https://claude.ai/api/mcp/auth_callback"),
    ]));
    match outcome {
        AuthorizeOutcome::ErrorRedirect(url) => {
            assert!(url.contains("error=invalid_request"));
            assert!(url.contains(&format!(
                "error_description={}",
                urlencoding::encode("code_challenge is required (PKCE)")
            )));
        }
        other => panic!("expected ErrorRedirect, got {other:?}"),
    }
}

#[tokio::test]
async fn test_authorize_rejects_plain_challenge_method() {
    let server = test_server();

    let outcome = server.authorize(&authorize_params(&[
        ("response_type", "code"),
        ("client_id", "test"),
        ("redirect_uri", "https://claude.ai/api/mcp/auth_callback"),
        ("code_challenge", "abc"),
        ("code_challenge_method", "plain"),
    ]));
    match outcome {
        AuthorizeOutcome::ErrorRedirect(url) => {
            assert!(url.contains("error=invalid_request"));
            assert!(url.contains("S256"));
        }
        other => panic!("expected ErrorRedirect, got {other:?}"),
    }
}

#[tokio::test]
async fn test_authorize_success_forwards_params_to_consent() {
    let server = test_server();
    let challenge = s256_challenge("verifier");

    let outcome = server.authorize(&authorize_params(&[
        ("response_type", "code"),
        ("client_id", "mcp_abc"),
        ("redirect_uri", "https://claude.ai/api/mcp/auth_callback"),
        ("code_challenge", challenge.as_str()),
        ("code_challenge_method", "S256"),
        ("state", "xyz"),
    ]));
    match outcome {
        AuthorizeOutcome::Consent(url) => {
            assert!(url.starts_with("http://localhost:3000/oauth/consent?"));
            assert!(url.contains("client_id=mcp_abc"));
            assert!(url.contains("code_challenge_method=S256"));
            assert!(url.contains("state=xyz"));
        }
        other => panic!("expected Consent, got {other:?}"),
    }
}

#[test]
fn test_token_request_parsing() {
    let form: HashMap<String, String> = serde_urlencoded::from_str(
        "grant_type=authorization_code&code=abc&redirect_uri=https%3A%2F%2Fclaude.ai%2Fapi%2Fmcp%2Fauth_callback&code_verifier=ver",
    )
    .unwrap();

    let request = TokenRequest::from_params(form).unwrap();
    assert_eq!(request.grant_type, "authorization_code");
    assert_eq!(request.code.as_deref(), Some("abc"));
    assert_eq!(
        request.redirect_uri.as_deref(),
        Some("https://claude.ai/api/mcp/auth_callback")
    );
    assert_eq!(request.code_verifier.as_deref(), Some("ver"));
}

#[test]
fn test_token_request_requires_grant_type() {
    let error = TokenRequest::from_params(HashMap::new()).unwrap_err();
    assert_eq!(error.error, "invalid_request");
}

#[tokio::test]
async fn test_unsupported_grant_type() {
    let server = test_server();

    let error = server
        .token(TokenRequest {
            grant_type: "client_credentials".into(),
            ..TokenRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(error.error, "unsupported_grant_type");
}

#[tokio::test]
async fn test_authorization_code_grant_requires_parameters() {
    let server = test_server();

    let error = server
        .token(TokenRequest {
            grant_type: "authorization_code".into(),
            ..TokenRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(error.error, "invalid_request");

    let error = server
        .token(TokenRequest {
            grant_type: "refresh_token".into(),
            ..TokenRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(error.error, "invalid_request");
}
