// ABOUTME: Shared server resources handed to every request handler
// ABOUTME: Bundles configuration, database, authentication, throttling, and host policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::middleware::hosts::HostPolicy;
use crate::rate_limiting::Throttler;

/// Long-lived resources shared by all handlers through axum state
pub struct ServerResources {
    /// Immutable server configuration
    pub config: Arc<ServerConfig>,
    /// Database handle
    pub database: Database,
    /// Token and password operations
    pub auth: AuthManager,
    /// Request throttling
    pub throttler: Throttler,
    /// Accepted `Host` header values
    pub hosts: HostPolicy,
}

impl ServerResources {
    /// Build resources from configuration and an open database
    #[must_use]
    pub fn new(config: ServerConfig, database: Database) -> Self {
        let auth = AuthManager::new(&config.secret_key, config.security.bcrypt_cost);
        let throttler = Throttler::new(config.throttle.clone());
        let hosts = HostPolicy::from_config(&config.security.allowed_hosts, config.debug);
        Self {
            config: Arc::new(config),
            database,
            auth,
            throttler,
            hosts,
        }
    }
}
