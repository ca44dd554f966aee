// ABOUTME: Unit tests for ESPN fan-profile parsing, SWID handling, and membership checks
// ABOUTME: Uses inline Fan API fixtures shaped like production responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use flaim_auth_worker::discovery::season_membership_verified;
use flaim_auth_worker::models::Sport;
use flaim_auth_worker::providers::espn::{
    bare_swid, game_code, normalize_swid, parse_fan_profile, sport_for_game_id, EspnError,
};

const FAN_PROFILE_FIXTURE: &str = r#"{
    "id": "{ABCDEF12-3456-7890-ABCD-EF1234567890}",
    "preferences": [
        {
            "type": { "id": 9, "code": "fantasy" },
            "metaData": {
                "entry": {
                    "entryId": 7,
                    "gameId": 1,
                    "seasonId": 2025,
                    "entryMetadata": { "teamName": "Gridiron Gurus" },
                    "groups": [
                        { "groupId": 12345, "groupName": "Office League" }
                    ]
                }
            }
        },
        {
            "type": { "id": 9, "code": "fantasy" },
            "metaData": {
                "entry": {
                    "entryId": "3",
                    "gameId": 3,
                    "seasonId": 2026,
                    "entryMetadata": { "teamName": "Hoop Dreams" },
                    "groups": [
                        { "groupId": "998877", "groupName": "Hardwood Heroes" }
                    ]
                }
            }
        },
        {
            "type": { "id": 2, "code": "show" },
            "metaData": { "entry": { "entryId": 1, "gameId": 1, "seasonId": 2025, "groups": [] } }
        },
        {
            "type": { "id": 9, "code": "fantasy" },
            "metaData": {
                "entry": { "entryId": 4, "gameId": 1, "seasonId": 2025, "groups": [] }
            }
        }
    ]
}"#;

#[test]
fn test_swid_normalization() {
    assert_eq!(
        normalize_swid(" ABCDEF12-3456-7890-ABCD-EF1234567890 "),
        "{ABCDEF12-3456-7890-ABCD-EF1234567890}"
    );
    assert_eq!(
        normalize_swid("{ABCDEF12-3456-7890-ABCD-EF1234567890}"),
        "{ABCDEF12-3456-7890-ABCD-EF1234567890}"
    );
    assert_eq!(
        bare_swid("{ABCDEF12-3456-7890-ABCD-EF1234567890}"),
        "ABCDEF12-3456-7890-ABCD-EF1234567890"
    );
}

#[test]
fn test_game_id_mapping() {
    assert_eq!(sport_for_game_id(1), Some(Sport::Football));
    assert_eq!(sport_for_game_id(2), Some(Sport::Baseball));
    assert_eq!(sport_for_game_id(3), Some(Sport::Basketball));
    assert_eq!(sport_for_game_id(4), Some(Sport::Hockey));
    assert_eq!(sport_for_game_id(99), None);

    assert_eq!(game_code(Sport::Football), "ffl");
    assert_eq!(game_code(Sport::Baseball), "flb");
    assert_eq!(game_code(Sport::Basketball), "fba");
    assert_eq!(game_code(Sport::Hockey), "fhl");
}

#[test]
fn test_fan_profile_filters_and_maps() {
    let leagues = parse_fan_profile(FAN_PROFILE_FIXTURE).unwrap();

    // The "show" preference and the group-less fantasy entry are dropped
    assert_eq!(leagues.len(), 2);

    let football = &leagues[0];
    assert_eq!(football.game_id, 1);
    assert_eq!(football.league_id, "12345");
    assert_eq!(football.league_name.as_deref(), Some("Office League"));
    assert_eq!(football.season_id, 2025);
    assert_eq!(football.team_id.as_deref(), Some("7"));
    assert_eq!(football.team_name.as_deref(), Some("Gridiron Gurus"));

    // String-typed ids survive as strings
    let basketball = &leagues[1];
    assert_eq!(basketball.league_id, "998877");
    assert_eq!(basketball.team_id.as_deref(), Some("3"));
}

#[test]
fn test_fan_profile_without_fantasy_entries_is_no_leagues() {
    let error = parse_fan_profile(r#"{ "preferences": [] }"#).unwrap_err();
    assert!(matches!(error, EspnError::NoLeaguesFound));

    let only_shows = r#"{
        "preferences": [
            { "type": { "code": "show" }, "metaData": { "entry": { "entryId": 1, "gameId": 1, "seasonId": 2025, "groups": [] } } }
        ]
    }"#;
    assert!(matches!(
        parse_fan_profile(only_shows).unwrap_err(),
        EspnError::NoLeaguesFound
    ));
}

#[test]
fn test_fan_profile_garbage_is_discovery_failure() {
    assert!(matches!(
        parse_fan_profile("not json at all").unwrap_err(),
        EspnError::DiscoveryFailed(_)
    ));
}

#[test]
fn test_season_membership_verification() {
    let team_ids: Vec<String> = vec!["1".into(), "2".into()];

    // Team 5 was not in the 2024 season: skip it
    assert!(!season_membership_verified(&team_ids, "5"));
    // Team 2 was: count and store it
    assert!(season_membership_verified(&team_ids, "2"));
    assert!(!season_membership_verified(&[], "1"));
}
