// ABOUTME: Eval trace middleware emitting structured request lifecycle events
// ABOUTME: Active only when eval trace headers are present on the request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::logging::{emit_trace_event, TraceIds, TracePhase};
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use uuid::Uuid;

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(std::borrow::ToOwned::to_owned)
}

/// Emit `request_start`/`request_end` events for eval-tagged requests
///
/// Requests without `X-Flaim-Eval-Run` or `X-Flaim-Eval-Trace` pass through
/// untouched and produce no events.
pub async fn eval_trace_middleware(request: Request, next: Next) -> Response {
    let run_id = header_value(request.headers(), "x-flaim-eval-run");
    let trace_id = header_value(request.headers(), "x-flaim-eval-trace");

    if run_id.is_none() && trace_id.is_none() {
        return next.run(request).await;
    }

    let correlation_id = header_value(request.headers(), "x-correlation-id")
        .or_else(|| Some(format!("req_{}", Uuid::new_v4().simple())));

    let ids = TraceIds {
        correlation_id,
        run_id,
        trace_id,
    };

    let path = request.uri().path().to_owned();
    let method = request.method().to_string();

    emit_trace_event(
        TracePhase::RequestStart,
        &ids,
        &path,
        &method,
        None,
        None,
        "request received",
    );

    let started = Instant::now();
    let response = next.run(request).await;
    let duration_ms = started.elapsed().as_millis();

    emit_trace_event(
        TracePhase::RequestEnd,
        &ids,
        &path,
        &method,
        Some(response.status().as_u16()),
        Some(duration_ms),
        "request completed",
    );

    response
}
