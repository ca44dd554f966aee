// ABOUTME: Outbound platform connector module for ESPN, Yahoo, and Sleeper
// ABOUTME: Each connector owns its HTTP client wiring and typed error taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// ESPN Fan API and v3 league API client
pub mod espn;
/// Sleeper public API client and username discovery
pub mod sleeper;
/// Yahoo OAuth 2.0 client and league enumeration
pub mod yahoo;
