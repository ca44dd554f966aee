// ABOUTME: Library entry point for the Flaim auth worker
// ABOUTME: Credential and OAuth 2.1 authorization broker for fantasy-sports MCP tooling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Flaim Auth Worker
//!
//! A credential and authorization broker sitting between end users (IdP
//! RS256 JWTs), AI assistants (OAuth 2.1 public clients), and fantasy-sports
//! platforms (ESPN cookies, Yahoo OAuth, Sleeper public identities).
//!
//! ## Architecture
//!
//! - **auth**: multi-mode bearer resolution with a shared JWKS cache
//! - **oauth2**: authorization server (S256 PKCE, refresh rotation, RFC 8707)
//! - **providers**: outbound ESPN / Yahoo / Sleeper connectors
//! - **discovery**: multi-season ESPN league discovery
//! - **database**: Postgres persistence for every store
//! - **routes**: Axum HTTP gateway mounted at `/` and `/auth`

/// Request authentication and JWKS handling
pub mod auth;
/// Configuration management
pub mod config;
/// Database layer
pub mod database;
/// ESPN league discovery engine
pub mod discovery;
/// Centralized error handling
pub mod errors;
/// Logging and eval trace events
pub mod logging;
/// HTTP middleware
pub mod middleware;
/// Core domain models
pub mod models;
/// OAuth 2.1 authorization server
pub mod oauth2;
/// Outbound platform connectors
pub mod providers;
/// Daily rate limiting
pub mod rate_limiting;
/// Shared server resources
pub mod resources;
/// HTTP routes
pub mod routes;
/// Season calendar
pub mod season;
