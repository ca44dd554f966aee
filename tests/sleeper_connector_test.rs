// ABOUTME: Unit tests for Sleeper API models and discovery helpers
// ABOUTME: Validates roster matching, league deserialization, and result shaping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use flaim_auth_worker::providers::sleeper::{
    match_roster, SleeperApiLeague, SleeperApiUser, SleeperDiscoveryResult, SleeperRoster,
    MAX_HISTORY_DEPTH,
};

#[test]
fn test_user_deserialization_handles_null_body() {
    // Sleeper returns a literal null for unknown usernames
    let missing: Option<SleeperApiUser> = serde_json::from_str("null").unwrap();
    assert!(missing.is_none());

    let found: Option<SleeperApiUser> = serde_json::from_str(
        r#"{ "user_id": "862156", "username": "fantasyfan", "display_name": "Fantasy Fan" }"#,
    )
    .unwrap();
    let user = found.unwrap();
    assert_eq!(user.user_id, "862156");
    assert_eq!(user.username.as_deref(), Some("fantasyfan"));
}

#[test]
fn test_league_deserialization() {
    let league: SleeperApiLeague = serde_json::from_str(
        r#"{
            "league_id": "998",
            "name": "Dynasty Forever",
            "season": "2025",
            "sport": "nfl",
            "previous_league_id": "887"
        }"#,
    )
    .unwrap();

    assert_eq!(league.league_id, "998");
    assert_eq!(league.season, "2025");
    assert_eq!(league.previous_league_id.as_deref(), Some("887"));
}

#[test]
fn test_roster_matching() {
    let rosters = vec![
        SleeperRoster {
            roster_id: 1,
            owner_id: Some("111".into()),
        },
        SleeperRoster {
            roster_id: 4,
            owner_id: Some("862156".into()),
        },
        SleeperRoster {
            roster_id: 7,
            owner_id: None,
        },
    ];

    assert_eq!(match_roster(&rosters, "862156"), Some(4));
    assert_eq!(match_roster(&rosters, "999"), None);
    assert_eq!(match_roster(&[], "862156"), None);
}

#[test]
fn test_history_depth_is_bounded() {
    assert_eq!(MAX_HISTORY_DEPTH, 5);
}

#[test]
fn test_discovery_result_omits_empty_warning() {
    let result = SleeperDiscoveryResult {
        success: true,
        username: "fantasyfan".into(),
        leagues_found: 2,
        seasons_discovered: 5,
        warning: None,
    };

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["leagues_found"], 2);
    assert_eq!(json["seasons_discovered"], 5);
    assert!(json.get("warning").is_none());

    let warned = SleeperDiscoveryResult {
        success: false,
        username: "fantasyfan".into(),
        leagues_found: 0,
        seasons_discovered: 0,
        warning: Some("football: Sleeper API returned 503".into()),
    };
    let json = serde_json::to_value(&warned).unwrap();
    assert!(json["warning"].as_str().unwrap().contains("503"));
}
