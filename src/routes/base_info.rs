// ABOUTME: Landing page statistics route
// ABOUTME: Reports review, rating, business profile, and offer aggregates to anonymous visitors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::errors::AppError;
use crate::middleware::Caller;
use crate::resources::ServerResources;

/// Statistics routes
pub struct BaseInfoRoutes;

impl BaseInfoRoutes {
    /// Create the base-info route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/base-info", get(Self::handle_base_info))
            .with_state(resources)
    }

    /// Handle GET /api/base-info/
    async fn handle_base_info(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
    ) -> Result<Response, AppError> {
        caller.throttle(&resources)?;
        let info = resources.database.stats().base_info().await?;
        Ok((StatusCode::OK, Json(info)).into_response())
    }
}
