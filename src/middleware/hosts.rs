// ABOUTME: Host header validation against the configured ALLOWED_HOSTS patterns
// ABOUTME: Rejects requests for unknown hosts with 400 before they reach a handler
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::HOST;
use tracing::warn;

use crate::constants::{defaults, messages};
use crate::errors::{AppError, ErrorCode};
use crate::resources::ServerResources;

/// Accepted `Host` values
///
/// Patterns are exact host names, `*` for any host, or `.example.com` for a domain and
/// all of its subdomains. Ports are ignored when matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPolicy {
    patterns: Vec<String>,
}

impl HostPolicy {
    /// Build the policy; an empty list in debug mode falls back to the loopback names
    #[must_use]
    pub fn from_config(allowed_hosts: &[String], debug: bool) -> Self {
        let patterns = if allowed_hosts.is_empty() && debug {
            defaults::DEBUG_ALLOWED_HOSTS
                .iter()
                .map(|h| (*h).to_owned())
                .collect()
        } else {
            allowed_hosts.iter().map(|h| h.to_lowercase()).collect()
        };
        Self { patterns }
    }

    /// Whether a raw `Host` header value is accepted
    #[must_use]
    pub fn is_allowed(&self, host: &str) -> bool {
        let Some(domain) = split_domain(host) else {
            return false;
        };
        self.patterns.iter().any(|pattern| matches_pattern(&domain, pattern))
    }
}

/// Lowercased domain of a `Host` value without port or trailing dot
fn split_domain(host: &str) -> Option<String> {
    let host = host.trim().to_lowercase();
    if host.is_empty() {
        return None;
    }
    let domain = if host.starts_with('[') {
        // IPv6 literal, keep the brackets
        let end = host.find(']')?;
        let (literal, rest) = host.split_at(end + 1);
        if !(rest.is_empty() || rest.starts_with(':')) {
            return None;
        }
        literal.to_owned()
    } else {
        match host.rsplit_once(':') {
            Some((domain, port)) if port.chars().all(|c| c.is_ascii_digit()) => domain.to_owned(),
            Some(_) => return None,
            None => host,
        }
    };
    let domain = domain.strip_suffix('.').map_or(domain.clone(), str::to_owned);
    (!domain.is_empty()).then_some(domain)
}

fn matches_pattern(domain: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    pattern.strip_prefix('.').map_or(domain == pattern, |suffix| {
        domain == suffix || domain.ends_with(pattern)
    })
}

/// Reject requests whose `Host` is not allowed
pub async fn validate_host(
    State(resources): State<Arc<ServerResources>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned)
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_owned()));

    match host {
        Some(host) if resources.hosts.is_allowed(&host) => next.run(request).await,
        host => {
            warn!(host = ?host, "Rejected request for disallowed host");
            AppError::new(ErrorCode::InvalidHost, messages::INVALID_HOST).into_response()
        }
    }
}
