// ABOUTME: OAuth 2.1 authorization server module
// ABOUTME: Groups protocol models, registration, policy, and endpoint logic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! OAuth 2.1 authorization server
//!
//! Implements metadata discovery, dynamic client registration (RFC 7591),
//! the authorization-code grant with mandatory S256 PKCE (RFC 7636), refresh
//! rotation, revocation (RFC 7009), and resource indicators (RFC 8707) for
//! MCP clients acting as public OAuth clients.

/// Dynamic client registration (RFC 7591)
pub mod client_registration;
/// Authorization and token endpoint logic
pub mod endpoints;
/// Protocol request/response models and error shapes
pub mod models;
/// Redirect-URI policy and client-name derivation
pub mod policy;

pub use endpoints::OAuth2AuthorizationServer;
pub use models::{OAuth2Error, TokenRequest, TokenResponse};
