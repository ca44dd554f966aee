// ABOUTME: Unit tests for the Yahoo connector: auth URLs, refresh window, league parsing
// ABOUTME: Uses a nested fantasy_content fixture mirroring Yahoo's response shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use flaim_auth_worker::models::{Sport, YahooCredential};
use flaim_auth_worker::providers::yahoo::{
    parse_user_leagues, YahooError, YahooOAuthClient, YAHOO_SCOPE,
};

fn test_client() -> YahooOAuthClient {
    YahooOAuthClient::from_config(&common::test_config().yahoo, reqwest::Client::new()).unwrap()
}

#[test]
fn test_client_requires_credentials() {
    let mut config = common::test_config().yahoo;
    config.client_secret = None;

    assert!(matches!(
        YahooOAuthClient::from_config(&config, reqwest::Client::new()),
        Err(YahooError::NotConfigured)
    ));
}

#[test]
fn test_authorize_url_carries_scope_and_state() {
    let url = test_client().authorize_url("user_123:some-uuid");

    assert!(url.starts_with("https://api.login.yahoo.com/oauth2/request_auth?"));
    assert!(url.contains(&format!("scope={YAHOO_SCOPE}")));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("state=user_123%3Asome-uuid"));
    assert!(url.contains(&format!(
        "redirect_uri={}",
        urlencoding::encode("http://localhost:8787/connect/yahoo/callback")
    )));
}

#[test]
fn test_needs_refresh_window() {
    let now = Utc::now();
    let base = YahooCredential {
        user_id: "user_1".into(),
        access_token: "at".into(),
        refresh_token: "rt".into(),
        expires_at: now,
        yahoo_guid: None,
    };

    let fresh = YahooCredential {
        expires_at: now + Duration::minutes(30),
        ..base.clone()
    };
    assert!(!fresh.needs_refresh(now));

    let closing = YahooCredential {
        expires_at: now + Duration::minutes(4),
        ..base.clone()
    };
    assert!(closing.needs_refresh(now));

    let expired = YahooCredential {
        expires_at: now - Duration::minutes(1),
        ..base
    };
    assert!(expired.needs_refresh(now));
}

#[test]
fn test_redirect_kinds() {
    assert_eq!(
        YahooError::TokenExchangeFailed("x".into()).redirect_kind(),
        "token_exchange_failed"
    );
    assert_eq!(YahooError::RefreshFailed("x".into()).redirect_kind(), "refresh_failed");
    assert_eq!(YahooError::NotConnected.redirect_kind(), "not_connected");
}

#[test]
fn test_parse_user_leagues_from_nested_payload() {
    let document = serde_json::json!({
        "fantasy_content": {
            "users": {
                "0": {
                    "user": [
                        { "guid": "USERGUID" },
                        {
                            "games": {
                                "0": {
                                    "game": [
                                        { "game_key": "461", "code": "nfl" },
                                        {
                                            "leagues": {
                                                "0": {
                                                    "league": [
                                                        {
                                                            "league_key": "nfl.l.12345",
                                                            "name": "Sunday Legends",
                                                            "season": "2025"
                                                        }
                                                    ]
                                                },
                                                "count": 1
                                            }
                                        }
                                    ]
                                },
                                "1": {
                                    "game": [
                                        { "game_key": "466", "code": "nba" },
                                        {
                                            "leagues": {
                                                "0": {
                                                    "league": [
                                                        {
                                                            "league_key": "nba.l.777",
                                                            "name": "Hoops",
                                                            "season": 2024
                                                        }
                                                    ]
                                                },
                                                "count": 1
                                            }
                                        }
                                    ]
                                },
                                "count": 2
                            }
                        }
                    ]
                },
                "count": 1
            }
        }
    });

    let mut leagues = parse_user_leagues(&document);
    leagues.sort_by(|a, b| a.league_key.cmp(&b.league_key));

    assert_eq!(leagues.len(), 2);
    assert_eq!(leagues[0].league_key, "nba.l.777");
    assert_eq!(leagues[0].sport, Sport::Basketball);
    assert_eq!(leagues[0].season_year, 2024);
    assert_eq!(leagues[1].league_key, "nfl.l.12345");
    assert_eq!(leagues[1].sport, Sport::Football);
    assert_eq!(leagues[1].league_name.as_deref(), Some("Sunday Legends"));
    assert_eq!(leagues[1].season_year, 2025);
}

#[test]
fn test_parse_user_leagues_ignores_unknown_games() {
    let document = serde_json::json!({
        "leagues": [
            { "league_key": "pga.l.1", "season": "2025" },
            { "league_key": "nhl.l.42", "name": "Ice", "season": "2024" }
        ]
    });

    let leagues = parse_user_leagues(&document);
    assert_eq!(leagues.len(), 1);
    assert_eq!(leagues[0].sport, Sport::Hockey);
}
