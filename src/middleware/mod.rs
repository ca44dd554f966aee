// ABOUTME: HTTP middleware for CORS and eval trace events
// ABOUTME: Applied at router assembly around every mounted route
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// CORS allowlist middleware with explicit preflight handling
pub mod cors;
/// Eval trace event middleware
pub mod tracing;
