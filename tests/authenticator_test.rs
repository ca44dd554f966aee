// ABOUTME: Unit tests for the multi-mode request authenticator
// ABOUTME: Covers bearer parsing, issuer allowlisting, and the eval API key strategy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::http::{header, HeaderMap, HeaderValue};
use flaim_auth_worker::auth::idp::{issuer_allowed, split_segments};
use flaim_auth_worker::auth::jwks::JwksCache;
use flaim_auth_worker::auth::{AuthType, RequestAuthenticator};
use flaim_auth_worker::config::environment::{Environment, PRODUCTION_ISSUER};
use flaim_auth_worker::errors::ErrorCode;
use std::sync::Arc;

fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

fn test_authenticator(config: flaim_auth_worker::config::environment::ServerConfig) -> RequestAuthenticator {
    let config = Arc::new(config);
    let jwks = Arc::new(JwksCache::new(reqwest::Client::new(), config.environment));
    RequestAuthenticator::new(config, common::lazy_database(), jwks)
}

#[test]
fn test_parse_bearer() {
    assert_eq!(
        RequestAuthenticator::parse_bearer(&bearer_headers("tok123")).as_deref(),
        Some("tok123")
    );

    let mut headers = HeaderMap::new();
    assert!(RequestAuthenticator::parse_bearer(&headers).is_none());

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert!(RequestAuthenticator::parse_bearer(&headers).is_none());

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert!(RequestAuthenticator::parse_bearer(&headers).is_none());
}

#[test]
fn test_split_segments() {
    assert!(split_segments("aaa.bbb.ccc").is_ok());
    assert!(split_segments("aaa.bbb").is_err());
    assert!(split_segments("aaa.bbb.ccc.ddd").is_err());
    assert!(split_segments("..").is_err());
    assert!(split_segments("eval-key-for-tests").is_err());
}

#[test]
fn test_issuer_allowlist() {
    let config = common::test_config();

    assert!(issuer_allowed(&config.idp.issuer, &config));
    assert!(issuer_allowed(PRODUCTION_ISSUER, &config));
    // Host-suffix wildcard for development IdP instances
    assert!(issuer_allowed("https://other-instance.clerk.accounts.dev", &config));
    // Suffix must be a host suffix, not a substring anywhere in the URL
    assert!(!issuer_allowed("https://evil.com/?x=.clerk.accounts.dev", &config));
    assert!(!issuer_allowed("https://clerk.accounts.dev.evil.com", &config));
    assert!(!issuer_allowed("https://unrelated.example.com", &config));
}

#[test]
fn test_issuer_allowlist_in_production() {
    let mut config = common::test_config();
    config.environment = Environment::Production;
    config.idp.issuer = PRODUCTION_ISSUER.into();

    assert!(issuer_allowed(PRODUCTION_ISSUER, &config));
    // Development instances are not accepted in production
    assert!(!issuer_allowed("https://dev-instance.clerk.accounts.dev", &config));
}

#[tokio::test]
async fn test_missing_bearer_is_unauthenticated() {
    let authenticator = test_authenticator(common::test_config());

    let error = authenticator
        .authenticate(&HeaderMap::new(), None, true)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::AuthRequired);
}

#[tokio::test]
async fn test_eval_api_key_resolves_to_configured_user() {
    let authenticator = test_authenticator(common::test_config());

    let result = authenticator
        .authenticate(&bearer_headers(common::EVAL_API_KEY), None, true)
        .await
        .unwrap();
    assert_eq!(result.auth_type, AuthType::Eval);
    assert_eq!(result.user_id, common::EVAL_USER_ID);
    assert_eq!(result.scope.as_deref(), Some("mcp:read"));
}

#[tokio::test]
async fn test_eval_api_key_resource_allowlist() {
    let authenticator = test_authenticator(common::test_config());

    // Allowed resources accept
    let result = authenticator
        .authenticate(
            &bearer_headers(common::EVAL_API_KEY),
            Some("http://localhost:8787/mcp"),
            true,
        )
        .await
        .unwrap();
    assert_eq!(result.auth_type, AuthType::Eval);

    let result = authenticator
        .authenticate(
            &bearer_headers(common::EVAL_API_KEY),
            Some("http://localhost:8787/fantasy/mcp"),
            true,
        )
        .await
        .unwrap();
    assert_eq!(result.auth_type, AuthType::Eval);

    // Anything else rejects with the resource error
    let error = authenticator
        .authenticate(
            &bearer_headers(common::EVAL_API_KEY),
            Some("http://localhost:8787/admin"),
            true,
        )
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotAllowed);
}

#[tokio::test]
async fn test_eval_api_key_requires_configured_user() {
    let mut config = common::test_config();
    config.eval.user_id = None;
    let authenticator = test_authenticator(config);

    // Key matches but no principal is configured: skip, not authenticate
    let error = authenticator
        .authenticate(&bearer_headers(common::EVAL_API_KEY), None, true)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::AuthRequired);
}

#[tokio::test]
async fn test_eval_api_key_disallowed_when_not_permitted() {
    let authenticator = test_authenticator(common::test_config());

    // allow_eval_api_key=false falls through to OAuth lookup, which fails
    // against the unreachable database, yielding the generic 401
    let error = authenticator
        .authenticate(&bearer_headers(common::EVAL_API_KEY), None, false)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::AuthRequired);
}
