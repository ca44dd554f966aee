// ABOUTME: Shared test utilities: config fixtures and a lazy database handle
// ABOUTME: The lazy pool never connects; suitable for exercising pure logic paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use flaim_auth_worker::config::environment::{
    Environment, EvalConfig, IdpConfig, ServerConfig, YahooConfig,
};
use flaim_auth_worker::database::Database;
use sqlx::postgres::PgPoolOptions;

/// Static eval API key used by fixtures
pub const EVAL_API_KEY: &str = "eval-key-for-tests";
/// Principal the eval key resolves to in fixtures
pub const EVAL_USER_ID: &str = "user_eval_fixture";

/// A development-mode configuration fixture
pub fn test_config() -> ServerConfig {
    ServerConfig {
        environment: Environment::Development,
        http_port: 8787,
        database_url: "postgres://localhost/unused".into(),
        base_url: "http://localhost:8787".into(),
        frontend_url: "http://localhost:3000".into(),
        idp: IdpConfig {
            issuer: "https://enabled-adder-42.clerk.accounts.dev".into(),
        },
        eval: EvalConfig {
            api_key: Some(EVAL_API_KEY.into()),
            user_id: Some(EVAL_USER_ID.into()),
        },
        yahoo: YahooConfig {
            client_id: Some("yahoo-client-id".into()),
            client_secret: Some("yahoo-client-secret".into()),
            redirect_uri: "http://localhost:8787/connect/yahoo/callback".into(),
        },
        cors_allowed_origins: vec![
            "http://localhost:3000".into(),
            "https://*.flaim.app".into(),
        ],
    }
}

/// A database handle over a lazy pool that never actually connects
///
/// Queries against it fail fast, which the pure-logic tests never trigger
/// (or explicitly expect).
pub fn lazy_database() -> Database {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost:1/unreachable")
        .expect("lazy pool construction cannot fail");
    Database::from_pool(pool)
}
