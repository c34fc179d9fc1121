// ABOUTME: HTTP middleware for host validation, CORS, request tracing, and caller resolution
// ABOUTME: Everything that runs around or ahead of the route handlers lives here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

/// Caller extraction (token authentication and client ident)
pub mod auth;
/// CORS layer configuration
pub mod cors;
/// `Host` header validation
pub mod hosts;
/// Default security response headers
pub mod security_headers;
/// Request spans and correlation ids
pub mod tracing;

pub use auth::{client_ident, Caller};
pub use cors::setup_cors;
pub use hosts::{validate_host, HostPolicy};
pub use security_headers::SecurityHeaders;
pub use self::tracing::{make_request_span, REQUEST_ID_HEADER};
