// ABOUTME: Unit tests for domain models and credential validation helpers
// ABOUTME: Covers SWID/s2 validation, sport parsing, and preference lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::Utc;
use flaim_auth_worker::models::{
    is_valid_s2, is_valid_swid, EspnCredential, LeagueDefault, Platform, Sport, UserPreferences,
};
use std::str::FromStr;

#[test]
fn test_swid_validation() {
    assert!(is_valid_swid("{ABCDEF12-3456-7890-ABCD-EF1234567890}"));
    assert!(is_valid_swid("{abcdef12-3456-7890-abcd-ef1234567890}"));

    // Missing braces
    assert!(!is_valid_swid("ABCDEF12-3456-7890-ABCD-EF1234567890"));
    // Wrong length
    assert!(!is_valid_swid("{ABCDEF12}"));
    // Invalid characters
    assert!(!is_valid_swid("{GHIJKL12-3456-7890-ABCD-EF1234567890}"));
    assert!(!is_valid_swid(""));
    assert!(!is_valid_swid("{}"));
}

#[test]
fn test_s2_validation() {
    assert!(is_valid_s2(&"a".repeat(50)));
    assert!(is_valid_s2(&"a".repeat(200)));
    assert!(!is_valid_s2(&"a".repeat(49)));
    assert!(!is_valid_s2(""));
}

#[test]
fn test_credential_completeness() {
    let credential = EspnCredential {
        user_id: "user_1".into(),
        swid: "{ABCDEF12-3456-7890-ABCD-EF1234567890}".into(),
        s2: "x".repeat(60),
        email: None,
        updated_at: Utc::now(),
    };
    assert!(credential.is_complete());

    let empty_s2 = EspnCredential {
        s2: String::new(),
        ..credential
    };
    assert!(!empty_s2.is_complete());
}

#[test]
fn test_sport_parsing() {
    assert_eq!(Sport::from_str("football").unwrap(), Sport::Football);
    assert_eq!(Sport::from_str("hockey").unwrap(), Sport::Hockey);
    assert!(Sport::from_str("cricket").is_err());
    assert!(Sport::from_str("Football").is_err());

    assert_eq!(Sport::Baseball.as_str(), "baseball");
    assert_eq!(serde_json::to_value(Sport::Basketball).unwrap(), "basketball");
}

#[test]
fn test_platform_parsing() {
    assert_eq!(Platform::from_str("espn").unwrap(), Platform::Espn);
    assert_eq!(Platform::from_str("yahoo").unwrap(), Platform::Yahoo);
    assert_eq!(Platform::from_str("sleeper").unwrap(), Platform::Sleeper);
    assert!(Platform::from_str("nfl.com").is_err());
}

#[test]
fn test_preferences_default_lookup() {
    let preferences = UserPreferences {
        default_sport: Some(Sport::Football),
        default_football: Some(LeagueDefault {
            platform: Platform::Espn,
            league_id: "12345".into(),
            season_year: 2025,
        }),
        ..UserPreferences::default()
    };

    let football = preferences.default_for(Sport::Football).unwrap();
    assert_eq!(football.league_id, "12345");
    assert!(preferences.default_for(Sport::Hockey).is_none());

    // Wire shape uses camelCase keys
    let json = serde_json::to_value(football).unwrap();
    assert_eq!(json["leagueId"], "12345");
    assert_eq!(json["seasonYear"], 2025);
    assert_eq!(json["platform"], "espn");
}
