// ABOUTME: Route module organization for the Coderr HTTP API
// ABOUTME: Groups handlers by domain and holds the helpers they share
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! Route module for the Coderr API
//!
//! Each domain module exposes a `*Routes` type whose `routes` function returns an
//! axum `Router` with the shared [`ServerResources`](crate::resources::ServerResources)
//! as state. Handlers authenticate through the [`Caller`](crate::middleware::Caller)
//! extractor, check permissions, apply throttles, and only then read the body.

/// Registration and login routes
pub mod auth;
/// Landing page statistics
pub mod base_info;
/// Health check and readiness routes
pub mod health;
/// Absolute link construction
pub mod links;
/// Offer and package routes
pub mod offers;
/// Order routes and business order counters
pub mod orders;
/// Request body parsing and field validation
pub mod payload;
/// Profile routes
pub mod profiles;
/// Review routes
pub mod reviews;

pub use auth::AuthRoutes;
pub use base_info::BaseInfoRoutes;
pub use health::HealthRoutes;
pub use offers::OfferRoutes;
pub use orders::OrderRoutes;
pub use profiles::ProfileRoutes;
pub use reviews::ReviewRoutes;

use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::middleware::Caller;

/// Parse a numeric path segment; anything else matches no route
///
/// # Errors
///
/// Returns 404 for non-numeric ids
pub(crate) fn parse_id(raw: &str, model: &str) -> AppResult<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(no_match(model));
    }
    raw.parse().map_err(|_| no_match(model))
}

/// 404 for a missing record of `model`
pub(crate) fn no_match(model: &str) -> AppError {
    AppError::not_found_detail(format!("No {model} matches the given query."))
}

/// Log permission failures before handing them back
pub(crate) fn authorize<T>(
    decision: AppResult<T>,
    caller: &Caller,
    resource: &str,
    action: &str,
) -> AppResult<T> {
    decision.inspect_err(|_| {
        AppLogger::log_permission_denied(
            caller.principal().map(|p| p.user_id),
            resource,
            action,
        );
    })
}
