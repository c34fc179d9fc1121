// ABOUTME: Main library entry point for the Coderr freelancer marketplace API
// ABOUTME: Exposes configuration, storage, auth, throttling, middleware, routes, and server assembly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Coderr
//!
//! REST backend for a freelancer marketplace. Business users publish offers with
//! basic, standard, and premium packages; customers order packages and review the
//! businesses they worked with; anyone can read the landing page statistics.
//!
//! ## Architecture
//!
//! - **Config**: environment-driven [`ServerConfig`](config::ServerConfig)
//! - **Database**: SQLite pool with one manager per domain
//! - **Auth**: opaque `Authorization: Token <key>` credentials stored as digests
//! - **Throttling**: fixed-window counters per scope and caller
//! - **Routes**: one `*Routes` type per domain, merged by [`server::build_app`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use coderr::config::ServerConfig;
//! use coderr::database::Database;
//! use coderr::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let database = Database::new(&config.database).await?;
//!     coderr::server::run(Arc::new(ServerResources::new(config, database))).await
//! }
//! ```

/// Token issuing, token lookup, and password hashing
pub mod auth;

/// Environment configuration
pub mod config;

/// Application constants and defaults
pub mod constants;

/// SQLite storage managers
pub mod database;

/// Error types shared with the core crate
pub mod errors;

/// Structured logging setup and security event logging
pub mod logging;

/// Request-level middleware and extractors
pub mod middleware;

/// Domain enums and value types
pub mod models;

/// Page-number pagination
pub mod pagination;

/// Permission policies
pub mod permissions;

/// Scoped request throttling
pub mod rate_limiting;

/// Shared handler state
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Application assembly and serving
pub mod server;
