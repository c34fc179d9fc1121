// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Exposes the environment-driven ServerConfig and its sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! Configuration module for the Coderr API
//!
//! All configuration is read from environment variables (optionally seeded from a
//! `.env` file). There is no configuration file format.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    DatabaseConfig, DatabaseUrl, LogLevel, SecretKey, SecurityConfig, ServerConfig, UrlConfig,
};
