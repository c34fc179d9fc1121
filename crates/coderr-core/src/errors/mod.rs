// ABOUTME: Unified error handling with standard error codes and HTTP response rendering
// ABOUTME: Defines AppError, ErrorCode, and field-level validation error collections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! # Unified Error Handling System
//!
//! Every fallible operation in the marketplace returns [`AppResult`]. Errors carry an
//! [`ErrorCode`] that decides the HTTP status, a human readable message, and optionally
//! a pre-rendered body (field validation maps) or structured details (rate limit data).
//!
//! Wire format:
//! - field validation errors render as `{"field": ["message"], "non_field_errors": [...]}`
//! - everything else renders as `{"detail": "message", "code": "ERROR_CODE"}`

/// Field-level validation error collection
pub mod validation;

pub use validation::{ValidationErrors, NON_FIELD_ERRORS};

use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::constants::messages;

/// When false, internal error messages are replaced by a generic message on the wire
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Toggle whether 5xx responses include the underlying error message (debug mode)
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

/// Whether 5xx responses currently include the underlying error message
#[must_use]
pub fn expose_internal_errors() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed)
}

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// No credentials were supplied for a protected resource
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired,
    /// Supplied credentials are unknown or inactive
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid,
    /// Authenticated caller lacks the required role or ownership
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied,

    // Rate Limiting
    /// Throttle window exhausted
    #[serde(rename = "RATE_LIMIT_EXCEEDED")]
    RateLimitExceeded,

    // Validation
    /// Request payload or query parameters failed validation
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Host header does not match the configured allow list
    #[serde(rename = "INVALID_HOST")]
    InvalidHost,

    // Resource Management
    /// Requested record does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound,

    // Configuration
    /// Startup configuration is missing or malformed
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,

    // Internal Errors
    /// Unexpected server-side failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    /// Database query or connection failure
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    /// JSON encoding or decoding failure of stored data
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput | Self::InvalidHost => 400,
            Self::AuthRequired | Self::AuthInvalid => 401,
            Self::PermissionDenied => 403,
            Self::ResourceNotFound => 404,
            Self::RateLimitExceeded => 429,
            Self::InternalError
            | Self::DatabaseError
            | Self::SerializationError
            | Self::ConfigError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::RateLimitExceeded => "Rate limit exceeded",
            Self::InvalidInput => "The provided input is invalid",
            Self::InvalidHost => "The request host is not allowed",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether this code represents a server-side failure
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
#[error("{}: {}", .code.description(), .message)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Structured details (rate limit windows, offending values)
    pub details: Option<Value>,
    /// Pre-rendered response body that replaces the default `detail` envelope
    pub body: Option<Value>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            body: None,
            source: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Replace the rendered response body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// JSON body sent to the client
    #[must_use]
    pub fn response_body(&self) -> Value {
        if let Some(body) = &self.body {
            return body.clone();
        }
        let detail = if self.code.is_server_error() && !expose_internal_errors() {
            messages::SERVER_ERROR
        } else {
            self.message.as_str()
        };
        json!({ "detail": detail, "code": self.code })
    }
}

/// Convenience constructors for common errors
impl AppError {
    /// Authentication credentials were not provided
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, messages::NOT_AUTHENTICATED)
    }

    /// Invalid authentication
    #[must_use]
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Authenticated caller is not allowed to perform the action
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Resource not found, rendered as `"{resource} not found."`
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found.", resource.into()),
        )
    }

    /// Not found with an exact client-facing message
    #[must_use]
    pub fn not_found_detail(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    /// Invalid input rendered with a `detail` envelope
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Invalid input rendered as a field error map
    #[must_use]
    pub fn validation(errors: ValidationErrors) -> Self {
        let body = errors.to_value();
        Self::new(ErrorCode::InvalidInput, errors.summary()).with_body(body)
    }

    /// Single field validation failure
    #[must_use]
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::validation(errors)
    }

    /// Validation failure not tied to a single field
    #[must_use]
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }

    /// Throttle exhausted; `retry_after` is the number of seconds until the window resets
    #[must_use]
    pub fn throttled(limit: u32, retry_after: u64, reset_at: i64) -> Self {
        Self::new(
            ErrorCode::RateLimitExceeded,
            format!("Request was throttled. Expected available in {retry_after} seconds."),
        )
        .with_details(json!({
            "limit": limit,
            "remaining": 0,
            "reset_at": reset_at,
            "retry_after": retry_after,
        }))
    }

    /// Internal server error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::SerializationError,
            format!("JSON processing failed: {error}"),
        )
        .with_source(error)
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(format!("Database operation failed: {error}")).with_source(error)
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use http::{HeaderMap, HeaderValue, StatusCode};

    use super::{AppError, ErrorCode};

    const RETRY_AFTER: &str = "retry-after";
    const X_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
    const X_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
    const X_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

    fn rate_limit_headers(error: &AppError) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some(details) = &error.details else {
            return headers;
        };
        for (key, header) in [
            ("limit", X_RATE_LIMIT_LIMIT),
            ("remaining", X_RATE_LIMIT_REMAINING),
            ("reset_at", X_RATE_LIMIT_RESET),
            ("retry_after", RETRY_AFTER),
        ] {
            if let Some(value) = details.get(key) {
                if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
                    headers.insert(header, value);
                }
            }
        }
        headers
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status =
                StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            if self.code.is_server_error() {
                tracing::error!(code = ?self.code, error = %self.message, "Request failed");
            } else {
                tracing::debug!(code = ?self.code, error = %self.message, "Request rejected");
            }

            let body = Json(self.response_body());
            if self.code == ErrorCode::RateLimitExceeded {
                (status, rate_limit_headers(&self), body).into_response()
            } else {
                (status, body).into_response()
            }
        }
    }
}
