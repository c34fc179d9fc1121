// ABOUTME: HTTP application assembly and server lifecycle for the Coderr API
// ABOUTME: Merges domain routers, applies the middleware stack, and serves with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! Server bootstrap
//!
//! Layers, outermost first: trailing-slash normalization, request id generation,
//! request tracing, request id propagation, timeout, CORS, security headers, and
//! the `Host` check.

use std::net::SocketAddr;
use std::sync::Arc;
use std::future;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::middleware::from_fn_with_state;
use axum::{Router, ServiceExt};
use tokio::net::TcpListener;
use tokio::signal;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::middleware::{make_request_span, setup_cors, validate_host, SecurityHeaders};
use crate::resources::ServerResources;
use crate::routes::{
    AuthRoutes, BaseInfoRoutes, HealthRoutes, OfferRoutes, OrderRoutes, ProfileRoutes,
    ReviewRoutes,
};

/// The complete HTTP application; paths are matched with or without a trailing slash
pub type App = NormalizePath<Router>;

/// Assemble the application with every route and middleware layer
#[must_use]
pub fn build_app(resources: Arc<ServerResources>) -> App {
    let timeout = Duration::from_secs(resources.config.security.request_timeout_secs);

    let router = Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(ProfileRoutes::routes(Arc::clone(&resources)))
        .merge(OfferRoutes::routes(Arc::clone(&resources)))
        .merge(OrderRoutes::routes(Arc::clone(&resources)))
        .merge(ReviewRoutes::routes(Arc::clone(&resources)))
        .merge(BaseInfoRoutes::routes(Arc::clone(&resources)))
        .layer(from_fn_with_state(Arc::clone(&resources), validate_host));

    let router = SecurityHeaders::default()
        .apply(router)
        .layer(setup_cors(&resources.config.security))
        .layer(TimeoutLayer::new(timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let addr = format!(
        "{}:{}",
        resources.config.host, resources.config.http_port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Coderr API listening on http://{addr}");

    let app = build_app(resources);
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server terminated with an error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received, starting graceful shutdown");
}
