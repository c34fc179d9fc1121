// ABOUTME: System-wide constants re-exported from coderr-core
// ABOUTME: Messages, limits, throttle defaults, and wire formats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

pub use coderr_core::constants::*;

/// Service identity used in logs
pub mod service_names {
    /// Name of the API server binary
    pub const CODERR_SERVER: &str = "coderr-server";
    /// Name of the admin CLI binary
    pub const CODERR_ADMIN: &str = "coderr-admin";
}

/// Runtime defaults for environment-driven configuration
pub mod defaults {
    /// Database used when `DATABASE_URL` is unset
    pub const DATABASE_URL: &str = "sqlite:./data/coderr.db";
    /// Pool size when `DATABASE_MAX_CONNECTIONS` is unset
    pub const DATABASE_MAX_CONNECTIONS: u32 = 10;
    /// Bind address
    pub const HOST: &str = "127.0.0.1";
    /// HTTP port
    pub const HTTP_PORT: u16 = 8000;
    /// Public prefix for uploaded profile files
    pub const MEDIA_URL: &str = "/media/";
    /// bcrypt work factor
    pub const BCRYPT_COST: u32 = 12;
    /// Per-request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Frontend origins allowed during local development
    pub const LOCAL_FRONTEND_ORIGINS: &str = "http://localhost:5500,http://127.0.0.1:5500,http://localhost:5501,http://127.0.0.1:5501";
    /// Hosts accepted in debug mode when `ALLOWED_HOSTS` is empty
    pub const DEBUG_ALLOWED_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];
}
