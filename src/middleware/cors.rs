// ABOUTME: CORS middleware configuration for the marketplace API
// ABOUTME: Builds a credentialed CorsLayer from the configured frontend origins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use http::header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::SecurityConfig;

/// Configure CORS from `CORS_ALLOWED_ORIGINS`
///
/// Credentials are always allowed so browser frontends can send the
/// `Authorization` header. An empty list disables cross-origin access and `*`
/// mirrors the request origin.
///
/// ```bash
/// export CORS_ALLOWED_ORIGINS="https://coderr.example.com,http://localhost:5500"
/// ```
#[must_use]
pub fn setup_cors(security: &SecurityConfig) -> CorsLayer {
    let configured = &security.cors_allowed_origins;

    let allow_origin = if configured.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = configured
            .iter()
            .filter_map(|origin| {
                HeaderValue::from_str(origin.trim_end_matches('/'))
                    .map_err(|_| warn!(origin = %origin, "Ignoring unparseable CORS origin"))
                    .ok()
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            ACCEPT,
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-csrftoken"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
}
