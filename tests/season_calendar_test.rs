// ABOUTME: Unit tests for the season calendar
// ABOUTME: Validates rollover behavior, year conversion round-trips, and labels
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use flaim_auth_worker::models::{Platform, Sport};
use flaim_auth_worker::season::{
    default_season_year, is_current_season, rollover_month, season_label, to_canonical_year,
    to_platform_year,
};

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
}

#[test]
fn test_rollover_months() {
    assert_eq!(rollover_month(Sport::Baseball), 2);
    assert_eq!(rollover_month(Sport::Football), 7);
    assert_eq!(rollover_month(Sport::Basketball), 8);
    assert_eq!(rollover_month(Sport::Hockey), 8);
}

#[test]
fn test_baseball_rollover_boundary() {
    // Mid-January is still the previous baseball season
    assert_eq!(default_season_year(Sport::Baseball, at("2026-01-15T17:00:00Z")), 2025);
    // 2026-02-01T05:00Z is 2026-02-01 00:00 in New York, so the season flips
    assert_eq!(default_season_year(Sport::Baseball, at("2026-02-01T05:00:00Z")), 2026);
}

#[test]
fn test_football_january_is_previous_season() {
    assert_eq!(default_season_year(Sport::Football, at("2026-01-15T17:00:00Z")), 2025);
    assert_eq!(default_season_year(Sport::Football, at("2026-07-01T12:00:00Z")), 2026);
}

#[test]
fn test_rollover_is_pinned_to_new_york() {
    // 2026-02-01T03:00Z is still 2026-01-31 22:00 in New York, so baseball
    // has not rolled over yet even though UTC is already in February
    assert_eq!(default_season_year(Sport::Baseball, at("2026-02-01T03:00:00Z")), 2025);
}

#[test]
fn test_is_current_season_agrees_with_default() {
    let instants = [
        at("2025-03-10T00:00:00Z"),
        at("2025-09-01T12:00:00Z"),
        at("2026-01-15T17:00:00Z"),
        at("2026-08-02T04:00:00Z"),
    ];

    for now in instants {
        for sport in Sport::ALL {
            let year = default_season_year(sport, now);
            assert!(is_current_season(sport, year, now));
            assert!(!is_current_season(sport, year - 1, now));
            assert!(!is_current_season(sport, year + 1, now));
        }
    }
}

#[test]
fn test_espn_uses_end_year_for_cross_year_sports() {
    assert_eq!(to_platform_year(2024, Sport::Basketball, Platform::Espn), 2025);
    assert_eq!(to_platform_year(2024, Sport::Hockey, Platform::Espn), 2025);
    assert_eq!(to_platform_year(2024, Sport::Football, Platform::Espn), 2024);
    assert_eq!(to_platform_year(2024, Sport::Baseball, Platform::Espn), 2024);

    assert_eq!(to_canonical_year(2025, Sport::Basketball, Platform::Espn), 2024);
    assert_eq!(to_canonical_year(2025, Sport::Hockey, Platform::Espn), 2024);
}

#[test]
fn test_year_conversion_round_trip() {
    for sport in Sport::ALL {
        for platform in [Platform::Espn, Platform::Yahoo, Platform::Sleeper] {
            for year in [2020, 2024, 2099] {
                let canonical = to_canonical_year(year, sport, platform);
                assert_eq!(to_platform_year(canonical, sport, platform), year);
            }
        }
    }
}

#[test]
fn test_season_labels() {
    assert_eq!(season_label(2024, Sport::Basketball), "2024-25");
    assert_eq!(season_label(2024, Sport::Hockey), "2024-25");
    assert_eq!(season_label(2024, Sport::Football), "2024");
    assert_eq!(season_label(2024, Sport::Baseball), "2024");
    // Century boundary keeps the two-digit zero padding
    assert_eq!(season_label(2099, Sport::Basketball), "2099-00");
}
