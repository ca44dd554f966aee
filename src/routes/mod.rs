// ABOUTME: Router assembly: mounts every route group at / and /auth with middleware
// ABOUTME: The /auth-preview mount exists only in preview deployments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Platform connector routes (Yahoo, Sleeper)
pub mod connect;
/// ESPN credential routes
pub mod credentials;
/// League management routes
pub mod leagues;
/// OAuth 2.1 protocol routes
pub mod oauth2;
/// User preference routes
pub mod preferences;

use crate::config::environment::Environment;
use crate::logging::SERVICE_NAME;
use crate::middleware::cors::cors_middleware;
use crate::middleware::tracing::eval_trace_middleware;
use crate::resources::ServerResources;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn api_routes(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(oauth2::OAuth2Routes::routes(resources.clone()))
        .merge(credentials::CredentialRoutes::routes(resources.clone()))
        .merge(leagues::LeagueRoutes::routes(resources.clone()))
        .merge(connect::ConnectRoutes::routes(resources.clone()))
        .merge(preferences::PreferenceRoutes::routes(resources.clone()))
        .route("/health", get(handle_health))
}

/// Assemble the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    let api = api_routes(&resources);

    let mut app = Router::new()
        .merge(api_routes(&resources))
        .nest("/auth", api);

    if resources.config.environment == Environment::Preview {
        app = app.nest("/auth-preview", api_routes(&resources));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                resources,
                cors_middleware,
            ))
            .layer(axum::middleware::from_fn(eval_trace_middleware))
            .layer(TraceLayer::new_for_http()),
    )
}
