// ABOUTME: Logging configuration and structured logging setup for the auth worker
// ABOUTME: Configures tracing subscriber output and emits eval trace events as JSON lines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Production-ready logging configuration with structured output

use anyhow::Result;
use serde_json::json;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service name reported in structured events
pub const SERVICE_NAME: &str = "auth-worker";

/// Log output format options
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (`RUST_LOG` syntax)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        Self { level, format }
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber has already been installed.
    pub fn init(&self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"));

        match self.format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().json())
                    .try_init()?;
            }
            LogFormat::Compact => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().compact())
                    .try_init()?;
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .try_init()?;
            }
        }

        Ok(())
    }
}

/// Initialize logging from environment variables
///
/// # Errors
///
/// Returns an error if subscriber installation fails.
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Request phase reported by eval trace events
#[derive(Debug, Clone, Copy)]
pub enum TracePhase {
    /// Emitted before the request is dispatched to a handler
    RequestStart,
    /// Emitted after the response has been produced
    RequestEnd,
}

impl TracePhase {
    const fn as_str(self) -> &'static str {
        match self {
            Self::RequestStart => "request_start",
            Self::RequestEnd => "request_end",
        }
    }
}

/// Identifiers extracted from eval trace headers
#[derive(Debug, Clone, Default)]
pub struct TraceIds {
    /// Correlation id propagated across services
    pub correlation_id: Option<String>,
    /// Eval run id
    pub run_id: Option<String>,
    /// Trace id
    pub trace_id: Option<String>,
}

/// Emit one structured trace event as a single JSON log line
///
/// Only called when the request carried `X-Flaim-Eval-Run` or
/// `X-Flaim-Eval-Trace`; regular traffic produces no eval events.
pub fn emit_trace_event(
    phase: TracePhase,
    ids: &TraceIds,
    path: &str,
    method: &str,
    status: Option<u16>,
    duration_ms: Option<u128>,
    message: &str,
) {
    let event = json!({
        "service": SERVICE_NAME,
        "phase": phase.as_str(),
        "correlation_id": ids.correlation_id,
        "run_id": ids.run_id,
        "trace_id": ids.trace_id,
        "path": path,
        "method": method,
        "status": status,
        "duration_ms": duration_ms,
        "message": message,
    });

    tracing::info!(target: "eval_trace", "{event}");
}
