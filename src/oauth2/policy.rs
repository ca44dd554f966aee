// ABOUTME: Redirect-URI acceptance policy and client-name derivation
// ABOUTME: Exact allowlist matching plus loopback callbacks; no prefix matches
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Redirect-URI policy
//!
//! A redirect URI is accepted iff it is an exact string match against the
//! AI-client callback allowlist, or a loopback URL whose host is `localhost`
//! or `127.0.0.1` (any port) with a path of exactly `/callback` or
//! `/oauth/callback` and no query or fragment. An allowlisted URL with
//! anything appended is invalid.

/// Exact callback URLs of known MCP clients
pub const ALLOWED_REDIRECT_URIS: &[&str] = &[
    "https://claude.ai/api/mcp/auth_callback",
    "https://claude.com/api/mcp/auth_callback",
    "https://chatgpt.com/connector_platform_oauth_redirect",
    "https://chat.openai.com/connector_platform_oauth_redirect",
];

const LOOPBACK_PATHS: &[&str] = &["/callback", "/oauth/callback"];

/// Whether `uri` is acceptable as an OAuth redirect target
#[must_use]
pub fn is_valid_redirect_uri(uri: &str) -> bool {
    if ALLOWED_REDIRECT_URIS.contains(&uri) {
        return true;
    }

    let Ok(parsed) = url::Url::parse(uri) else {
        return false;
    };

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return false;
    }

    let is_loopback_host =
        matches!(parsed.host_str(), Some("localhost") | Some("127.0.0.1"));

    matches!(parsed.scheme(), "http" | "https")
        && is_loopback_host
        && LOOPBACK_PATHS.contains(&parsed.path())
}

/// Derive a display name for a client from its redirect URI
///
/// Matching is by host substring so subdomains resolve to the same product
/// name. Unknown hosts fall back to the generic MCP client label.
#[must_use]
pub fn derive_client_name(redirect_uri: &str) -> String {
    let host = url::Url::parse(redirect_uri)
        .ok()
        .and_then(|url| url.host_str().map(std::borrow::ToOwned::to_owned))
        .unwrap_or_default();

    let name = if host.contains("claude.ai") || host.contains("claude.com") {
        "Claude"
    } else if host.contains("chatgpt.com") || host.contains("openai.com") {
        "ChatGPT"
    } else if host.contains("gemini") || host.contains("google.com") {
        "Gemini"
    } else if host == "localhost" || host == "127.0.0.1" {
        "Development"
    } else {
        "MCP Client"
    };

    name.to_owned()
}
