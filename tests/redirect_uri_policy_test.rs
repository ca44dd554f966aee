// ABOUTME: Unit tests for the redirect-URI policy and client-name derivation
// ABOUTME: Validates exact allowlisting, loopback rules, and prefix-match rejection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use flaim_auth_worker::oauth2::policy::{
    derive_client_name, is_valid_redirect_uri, ALLOWED_REDIRECT_URIS,
};

#[test]
fn test_allowlisted_urls_match_exactly() {
    for uri in ALLOWED_REDIRECT_URIS {
        assert!(is_valid_redirect_uri(uri), "allowlisted URI rejected: {uri}");
    }
}

#[test]
fn test_appended_query_invalidates_allowlisted_url() {
    for uri in ALLOWED_REDIRECT_URIS {
        let with_query = format!("{uri}?y=z");
        assert!(
            !is_valid_redirect_uri(&with_query),
            "prefix match accepted: {with_query}"
        );
    }
}

#[test]
fn test_loopback_callbacks() {
    assert!(is_valid_redirect_uri("http://127.0.0.1:9999/callback"));
    assert!(is_valid_redirect_uri("http://localhost:3000/callback"));
    assert!(is_valid_redirect_uri("http://localhost:3000/oauth/callback"));
    assert!(is_valid_redirect_uri("http://localhost/callback"));
    assert!(is_valid_redirect_uri("https://localhost:8443/callback"));
}

#[test]
fn test_loopback_rejections() {
    // Wrong path
    assert!(!is_valid_redirect_uri("http://localhost:9999/evil"));
    // Open-redirect smuggled through the query string
    assert!(!is_valid_redirect_uri(
        "http://localhost:3000/oauth/callback?redirect=http://evil.com"
    ));
    // Fragments are never acceptable
    assert!(!is_valid_redirect_uri("http://localhost:3000/callback#frag"));
    // Non-loopback hosts are not loopback
    assert!(!is_valid_redirect_uri("http://localhost.evil.com/callback"));
    assert!(!is_valid_redirect_uri("http://192.168.1.10:3000/callback"));
    // Path prefixes do not count
    assert!(!is_valid_redirect_uri("http://localhost:3000/callback/extra"));
}

#[test]
fn test_unknown_hosts_rejected() {
    assert!(!is_valid_redirect_uri("https://evil.com/api/mcp/auth_callback"));
    assert!(!is_valid_redirect_uri("not a url"));
    assert!(!is_valid_redirect_uri(""));
}

#[test]
fn test_client_name_derivation() {
    assert_eq!(
        derive_client_name("https://claude.ai/api/mcp/auth_callback"),
        "Claude"
    );
    assert_eq!(
        derive_client_name("https://chatgpt.com/connector_platform_oauth_redirect"),
        "ChatGPT"
    );
    assert_eq!(
        derive_client_name("https://chat.openai.com/connector_platform_oauth_redirect"),
        "ChatGPT"
    );
    assert_eq!(
        derive_client_name("https://gemini.google.com/oauth/callback"),
        "Gemini"
    );
    assert_eq!(derive_client_name("http://localhost:3000/callback"), "Development");
    assert_eq!(derive_client_name("http://127.0.0.1:8080/callback"), "Development");
    assert_eq!(derive_client_name("https://example.com/callback"), "MCP Client");
    assert_eq!(derive_client_name("garbage"), "MCP Client");
}
