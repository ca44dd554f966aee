// ABOUTME: Sport season calendar with timezone-pinned rollover dates
// ABOUTME: Maps between canonical season years, platform wire years, and display labels
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Season calendar
//!
//! Season years are stored canonically as the start year of the season. The
//! rollover point is computed in `America/New_York` rather than the process
//! timezone so deployments in other regions agree on the current season.
//! ESPN reports basketball and hockey seasons by their end year on the wire;
//! the conversion helpers translate at the platform boundary.

use crate::models::{Platform, Sport};
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::America::New_York;

/// Calendar month (1-indexed) at which the sport's season flips forward
#[must_use]
pub const fn rollover_month(sport: Sport) -> u32 {
    match sport {
        Sport::Baseball => 2,
        Sport::Football => 7,
        Sport::Basketball | Sport::Hockey => 8,
    }
}

/// Sports whose seasons span two calendar years
#[must_use]
pub const fn is_cross_year(sport: Sport) -> bool {
    matches!(sport, Sport::Basketball | Sport::Hockey)
}

/// Canonical season year in effect at `now` for the given sport
#[must_use]
pub fn default_season_year(sport: Sport, now: DateTime<Utc>) -> i32 {
    let local = now.with_timezone(&New_York);
    if local.month() < rollover_month(sport) {
        local.year() - 1
    } else {
        local.year()
    }
}

/// Whether `year` is the current canonical season for the sport
#[must_use]
pub fn is_current_season(sport: Sport, year: i32, now: DateTime<Utc>) -> bool {
    year == default_season_year(sport, now)
}

/// Convert a canonical season year to the platform's wire year
#[must_use]
pub const fn to_platform_year(year: i32, sport: Sport, platform: Platform) -> i32 {
    match platform {
        // ESPN reports cross-year sports by their end year
        Platform::Espn if is_cross_year(sport) => year + 1,
        _ => year,
    }
}

/// Convert a platform wire year back to the canonical season year
#[must_use]
pub const fn to_canonical_year(platform_year: i32, sport: Sport, platform: Platform) -> i32 {
    match platform {
        Platform::Espn if is_cross_year(sport) => platform_year - 1,
        _ => platform_year,
    }
}

/// Human-readable season label: `"YYYY-YY"` for cross-year sports, `"YYYY"` otherwise
#[must_use]
pub fn season_label(year: i32, sport: Sport) -> String {
    if is_cross_year(sport) {
        let end = (year + 1).rem_euclid(100);
        format!("{year}-{end:02}")
    } else {
        format!("{year}")
    }
}
