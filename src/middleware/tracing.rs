// ABOUTME: Request tracing helpers for correlation and structured logging
// ABOUTME: Creates one span per HTTP request carrying the request id and caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use axum::body::Body;
use http::Request;
use tracing::{field, info_span, Span};

/// Header carrying the request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Span factory for `TraceLayer::make_span_with`
///
/// The `user_id` field starts empty and is filled in once the caller authenticates.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        user_id = field::Empty,
    )
}

/// Record the authenticated user on the current request span
pub fn record_user(user_id: i64) {
    Span::current().record("user_id", user_id);
}
