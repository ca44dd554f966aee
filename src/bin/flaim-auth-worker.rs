// ABOUTME: Server binary: loads config, runs migrations, and serves the HTTP gateway
// ABOUTME: Shuts down gracefully on SIGINT/SIGTERM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::expect_used)]

use anyhow::{Context, Result};
use clap::Parser;
use flaim_auth_worker::config::environment::ServerConfig;
use flaim_auth_worker::database::Database;
use flaim_auth_worker::logging;
use flaim_auth_worker::resources::ServerResources;
use flaim_auth_worker::routes;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "flaim-auth-worker", about = "Flaim credential and authorization broker")]
struct Args {
    /// Override the HTTP listen port
    #[arg(long)]
    port: Option<u16>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let args = Args::parse();
    let mut config = ServerConfig::from_env().context("configuration")?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    tracing::info!(
        environment = ?config.environment,
        port = config.http_port,
        base_url = %config.base_url,
        "Starting auth worker"
    );

    let database = Database::new(&config.database_url)
        .await
        .context("database connection")?;
    database.migrate().await.context("database migration")?;
    tracing::info!("Database migrations complete");

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(config, database));
    let app = routes::router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    tracing::info!(port, "HTTP gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server")?;

    Ok(())
}
