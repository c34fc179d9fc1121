// ABOUTME: Default security response headers for every API response
// ABOUTME: Mirrors the framework defaults for clickjacking, MIME sniffing, and referrer leakage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use axum::Router;
use http::header::{HeaderName, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use http::HeaderValue;
use tower_http::set_header::SetResponseHeaderLayer;

/// Response headers added when a handler has not set them
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    /// X-Frame-Options header value
    pub frame_options: HeaderValue,
    /// X-Content-Type-Options header value
    pub content_type_options: HeaderValue,
    /// Referrer-Policy header value
    pub referrer_policy: HeaderValue,
    /// Cross-Origin-Opener-Policy header value
    pub coop: HeaderValue,
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self {
            frame_options: HeaderValue::from_static("DENY"),
            content_type_options: HeaderValue::from_static("nosniff"),
            referrer_policy: HeaderValue::from_static("same-origin"),
            coop: HeaderValue::from_static("same-origin"),
        }
    }
}

impl SecurityHeaders {
    /// Header name and value pairs
    #[must_use]
    pub fn to_headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        vec![
            (X_FRAME_OPTIONS, self.frame_options.clone()),
            (X_CONTENT_TYPE_OPTIONS, self.content_type_options.clone()),
            (REFERRER_POLICY, self.referrer_policy.clone()),
            (
                HeaderName::from_static("cross-origin-opener-policy"),
                self.coop.clone(),
            ),
        ]
    }

    /// Wrap `router` with one `SetResponseHeaderLayer` per header
    #[must_use]
    pub fn apply(&self, router: Router) -> Router {
        self.to_headers()
            .into_iter()
            .fold(router, |router, (name, value)| {
                router.layer(SetResponseHeaderLayer::if_not_present(name, value))
            })
    }
}
