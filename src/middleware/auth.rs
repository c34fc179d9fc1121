// ABOUTME: Request caller extraction for token authentication and throttle identity
// ABOUTME: Resolves the Authorization header to a principal and the client address to an ident
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::net::SocketAddr;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use http::request::Parts;
use http::HeaderMap;

use crate::errors::{AppError, AppResult};
use crate::middleware::tracing::record_user;
use crate::permissions::Principal;
use crate::resources::ServerResources;

/// Header set by reverse proxies with the originating client chain
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// The caller of a request: an optional authenticated principal plus its network ident
#[derive(Debug, Clone)]
pub struct Caller {
    /// Authenticated account, `None` for anonymous requests
    pub principal: Option<Principal>,
    /// Client ident used for anonymous throttling
    pub client_ip: String,
}

impl Caller {
    /// Borrow the principal
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Apply the default anon/user throttles for this caller
    ///
    /// # Errors
    ///
    /// Returns 429 when a window is exhausted
    pub fn throttle(&self, resources: &ServerResources) -> AppResult<()> {
        resources
            .throttler
            .enforce_default(self.principal(), &self.client_ip)
    }
}

/// Client ident: the forwarded-for chain with whitespace removed, else the peer address
#[must_use]
pub fn client_ident(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split_whitespace().collect::<String>())
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_owned())
}

#[async_trait]
impl FromRequestParts<Arc<ServerResources>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        resources: &Arc<ServerResources>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let client_ip = client_ident(&parts.headers, peer);

        let principal = resources
            .auth
            .authenticate(&resources.database.tokens(), &parts.headers)
            .await?;
        if let Some(principal) = &principal {
            record_user(principal.user_id);
        }

        Ok(Self {
            principal,
            client_ip,
        })
    }
}
