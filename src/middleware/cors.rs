// ABOUTME: CORS middleware over a fixed origin allowlist with wildcard support
// ABOUTME: Answers preflight OPTIONS directly with 204 and the negotiated headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::resources::ServerResources;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

const ALLOWED_METHODS: &str = "GET,POST,PUT,PATCH,DELETE,OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE_SECONDS: &str = "86400";

/// Whether `origin` matches an allowlist entry
///
/// Entries may carry a single `*` wildcard (`https://*.flaim.app`); matching
/// is prefix + suffix around the wildcard, exact otherwise.
#[must_use]
pub fn origin_allowed(origin: &str, allowlist: &[String]) -> bool {
    allowlist.iter().any(|pattern| {
        pattern.split_once('*').map_or_else(
            || pattern == origin,
            |(prefix, suffix)| {
                origin.len() > prefix.len() + suffix.len()
                    && origin.starts_with(prefix)
                    && origin.ends_with(suffix)
            },
        )
    })
}

fn apply_cors_headers(response: &mut Response, origin: &HeaderValue) {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

/// CORS middleware: answers preflights, decorates allowed cross-origin responses
pub async fn cors_middleware(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    let allowed_origin = origin.filter(|value| {
        value
            .to_str()
            .is_ok_and(|origin| origin_allowed(origin, &resources.config.cors_allowed_origins))
    });

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        if let Some(origin) = &allowed_origin {
            apply_cors_headers(&mut response, origin);
            let headers = response.headers_mut();
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            );
            headers.insert(
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static(MAX_AGE_SECONDS),
            );
        }
        return response;
    }

    let mut response = next.run(request).await;
    if let Some(origin) = &allowed_origin {
        apply_cors_headers(&mut response, origin);
    }
    response
}
