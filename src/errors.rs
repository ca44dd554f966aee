// ABOUTME: Centralized error handling and error types for the auth worker
// ABOUTME: Defines error codes, HTTP status mapping, and JSON response shaping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Unified Error Handling
//!
//! Leaf operations return typed errors; HTTP handlers map them to status
//! codes through [`AppError`]'s `IntoResponse` implementation. Client-facing
//! messages are sanitized: validation messages are safe to echo, everything
//! else falls back to the code's generic description.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Authentication is required but not provided or not resolvable
    AuthRequired,
    /// Authentication credentials are invalid
    AuthInvalid,
    /// The bearer credential is valid but not allowed for the requested resource
    ResourceNotAllowed,

    // Validation
    /// Input validation failed
    InvalidInput,
    /// A referenced sport is not one of the supported sports
    InvalidSport,

    // Resource state
    /// Requested resource was not found
    ResourceNotFound,
    /// Resource already exists (duplicate league)
    DuplicateResource,
    /// Per-user league limit reached
    LimitExceeded,

    // Rate limiting
    /// Daily rate limit has been exceeded
    RateLimitExceeded,

    // Upstream platforms
    /// ESPN rejected the stored cookies
    EspnAuthFailed,
    /// ESPN returned an unexpected response
    EspnApiError,
    /// Automatic league discovery failed
    DiscoveryFailed,
    /// The user has not connected the requested platform
    PlatformNotConnected,
    /// Upstream token refresh failed
    RefreshFailed,
    /// An external service returned an error
    ExternalServiceError,

    // Internal
    /// Internal server error
    InternalError,
    /// Database operation failed
    DatabaseError,
    /// Configuration error occurred
    ConfigError,
}

impl ErrorCode {
    /// Get the `HTTP` status code for this error
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::InvalidSport | Self::LimitExceeded => {
                StatusCode::BAD_REQUEST
            }

            Self::AuthRequired
            | Self::AuthInvalid
            | Self::ResourceNotAllowed
            | Self::EspnAuthFailed
            | Self::RefreshFailed => StatusCode::UNAUTHORIZED,

            Self::ResourceNotFound | Self::PlatformNotConnected => StatusCode::NOT_FOUND,

            Self::DuplicateResource => StatusCode::CONFLICT,

            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,

            Self::EspnApiError
            | Self::DiscoveryFailed
            | Self::ExternalServiceError
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wire identifier serialized into the `error` field of responses
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthRequired | Self::AuthInvalid => "unauthorized",
            Self::ResourceNotAllowed => "resource_not_allowed",
            Self::InvalidInput => "invalid_request",
            Self::InvalidSport => "invalid_sport",
            Self::ResourceNotFound => "not_found",
            Self::DuplicateResource => "DUPLICATE",
            Self::LimitExceeded => "LIMIT_EXCEEDED",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::EspnAuthFailed => "EspnAuthenticationFailed",
            Self::EspnApiError => "EspnApiError",
            Self::DiscoveryFailed => "AutomaticLeagueDiscoveryFailed",
            Self::PlatformNotConnected => "not_connected",
            Self::RefreshFailed => "refresh_failed",
            Self::ExternalServiceError => "upstream_error",
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                "Internal server error"
            }
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::ResourceNotAllowed => "Resource not allowed for API key",
            Self::InvalidInput => "The provided input is invalid",
            Self::InvalidSport => "The requested sport is not supported",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::DuplicateResource => "A resource with this identifier already exists",
            Self::LimitExceeded => "The per-user league limit has been reached",
            Self::RateLimitExceeded => "Rate limit exceeded",
            Self::EspnAuthFailed => "ESPN rejected the stored credentials",
            Self::EspnApiError => "ESPN returned an unexpected response",
            Self::DiscoveryFailed => "Automatic league discovery failed",
            Self::PlatformNotConnected => "This platform has not been connected",
            Self::RefreshFailed => "Upstream token refresh failed",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::ConfigError => "Configuration error encountered",
        }
    }
}

/// Application error carrying a code and a human-readable message
#[derive(Debug, Clone, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the `HTTP` status code for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Get sanitized message safe for client exposure
    ///
    /// Validation and upstream-auth messages are already client-safe;
    /// internal errors are replaced with the generic description.
    #[must_use]
    pub fn sanitized_message(&self) -> String {
        match self.code {
            ErrorCode::InvalidInput
            | ErrorCode::InvalidSport
            | ErrorCode::LimitExceeded
            | ErrorCode::DuplicateResource
            | ErrorCode::ResourceNotFound
            | ErrorCode::ResourceNotAllowed
            | ErrorCode::PlatformNotConnected
            | ErrorCode::EspnAuthFailed
            | ErrorCode::RateLimitExceeded
            | ErrorCode::RefreshFailed => self.message.clone(),
            _ => self.code.description().to_owned(),
        }
    }

    /// Full error details for internal logging, never sent to clients
    #[must_use]
    pub fn internal_details(&self) -> String {
        format!("{:?}: {}", self.code, self.message)
    }

    /// Authentication required / missing-or-invalid bearer
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Missing or invalid authentication")
    }

    /// Invalid authentication
    #[must_use]
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Resource not found
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::new(ErrorCode::ResourceNotFound, format!("{resource} not found"))
    }

    /// Internal server error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// JSON error body rendered to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error kind identifying the type of error
    pub error: String,
    /// Human-readable error message (sanitized for client)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.code.as_str().to_owned(),
            message: Some(error.sanitized_message()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!("API error: {}", self.internal_details());
        let body = ErrorResponse::from(&self);
        (self.http_status(), Json(body)).into_response()
    }
}
