// ABOUTME: Configuration module for environment-driven server settings
// ABOUTME: Re-exports the environment configuration loader
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Environment-based configuration management
pub mod environment;
