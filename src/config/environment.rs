// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses secrets, hosts, database, CORS/CSRF origins, and throttle rates from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! Environment-based configuration management

use std::env;
use std::fmt::{self, Debug, Display, Formatter};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::{defaults, throttle};
use crate::rate_limiting::{ThrottleConfig, ThrottleRate};

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    #[default]
    Info,
    /// Debug output
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Type-safe database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// Accepts `sqlite:<path>`, `sqlite://<path>`, and `sqlite::memory:`.
    ///
    /// # Errors
    ///
    /// Returns an error for `PostgreSQL` URLs (not supported by this build) and unknown schemes
    pub fn parse_url(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("sqlite:") {
            let path = rest.strip_prefix("//").unwrap_or(rest);
            if path == ":memory:" || path.is_empty() {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path),
                })
            }
        } else if s.starts_with("postgresql://") || s.starts_with("postgres://") {
            Err(anyhow!(
                "PostgreSQL DATABASE_URL is not supported; use a sqlite: URL"
            ))
        } else {
            Err(anyhow!("Unsupported DATABASE_URL scheme: {s}"))
        }
    }

    /// Connection string understood by sqlx
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Whether the database lives in memory
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/coderr.db"),
        }
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_connection_string())
    }
}

/// Secret used to key token digests; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wrap a secret
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Raw secret bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Where the data lives
    pub url: DatabaseUrl,
    /// Pool size for file-backed databases
    pub max_connections: u32,
}

/// Cross-origin and credential settings
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Origins allowed to call the API from a browser (`*` allows any)
    pub cors_allowed_origins: Vec<String>,
    /// Origins trusted for unsafe cross-site requests
    pub csrf_trusted_origins: Vec<String>,
    /// Host header allow list
    pub allowed_hosts: Vec<String>,
    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// URL building settings
#[derive(Debug, Clone)]
pub struct UrlConfig {
    /// Prefix the service is mounted under behind a proxy (empty for root)
    pub force_script_name: String,
    /// Public prefix for profile files
    pub media_url: String,
}

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Debug mode (`DEBUG=True`)
    pub debug: bool,
    /// Key for token digests
    pub secret_key: SecretKey,
    /// Bind address
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Database settings
    pub database: DatabaseConfig,
    /// Origins, hosts, and password hashing
    pub security: SecurityConfig,
    /// Throttle table
    pub throttle: ThrottleConfig,
    /// Absolute URL building
    pub urls: UrlConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// # Errors
    ///
    /// Returns an error when `SECRET_KEY` is unset or any value fails to parse
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            info!("No .env file loaded: {e}");
        }

        let secret_key = env::var("SECRET_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("SECRET_KEY environment variable is required"))?;

        let debug = env_var_or("DEBUG", "False") == "True";

        let config = Self {
            debug,
            secret_key: SecretKey::new(secret_key),
            host: env_var_or("HOST", defaults::HOST),
            http_port: env_var_or("HTTP_PORT", &defaults::HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            log_level: LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info")),
            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&env_var_or("DATABASE_URL", defaults::DATABASE_URL))?,
                max_connections: env_var_or(
                    "DATABASE_MAX_CONNECTIONS",
                    &defaults::DATABASE_MAX_CONNECTIONS.to_string(),
                )
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS value")?,
            },
            security: SecurityConfig {
                cors_allowed_origins: parse_list(&env_var_or(
                    "CORS_ALLOWED_ORIGINS",
                    defaults::LOCAL_FRONTEND_ORIGINS,
                )),
                csrf_trusted_origins: parse_list(&env_var_or(
                    "CSRF_TRUSTED_ORIGINS",
                    defaults::LOCAL_FRONTEND_ORIGINS,
                )),
                allowed_hosts: parse_list(&env_var_or("ALLOWED_HOSTS", "")),
                bcrypt_cost: env_var_or("BCRYPT_COST", &defaults::BCRYPT_COST.to_string())
                    .parse()
                    .context("Invalid BCRYPT_COST value")?,
                request_timeout_secs: env_var_or(
                    "REQUEST_TIMEOUT_SECS",
                    &defaults::REQUEST_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid REQUEST_TIMEOUT_SECS value")?,
            },
            throttle: ThrottleConfig {
                enabled: env_var_or("THROTTLE_ENABLED", "true")
                    .parse()
                    .context("Invalid THROTTLE_ENABLED value")?,
                anon: parse_rate("THROTTLE_ANON", throttle::ANON)?,
                user: parse_rate("THROTTLE_USER", throttle::USER)?,
                login: parse_rate("THROTTLE_LOGIN", throttle::LOGIN)?,
                registration: parse_rate("THROTTLE_REGISTRATION", throttle::REGISTRATION)?,
                order_create: parse_rate("THROTTLE_ORDER_CREATE", throttle::ORDER_CREATE)?,
            },
            urls: UrlConfig {
                force_script_name: normalize_script_name(&env_var_or("FORCE_SCRIPT_NAME", "")),
                media_url: env_var_or("MEDIA_URL", defaults::MEDIA_URL),
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error when the bcrypt cost is outside the supported range
    pub fn validate(&self) -> Result<()> {
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(anyhow!("BCRYPT_COST must be between 4 and 31"));
        }
        if !self.debug && self.security.allowed_hosts.is_empty() {
            warn!("ALLOWED_HOSTS is empty and DEBUG is off; every request will be rejected");
        }
        if self.security.cors_allowed_origins.iter().any(|o| o == "*") {
            warn!("CORS allows any origin");
        }
        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Coderr API Configuration:\n\
             - Bind: {}:{}\n\
             - Debug: {}\n\
             - Log Level: {}\n\
             - Database: {}\n\
             - Allowed Hosts: {}\n\
             - CORS Origins: {}\n\
             - CSRF Trusted Origins: {}\n\
             - Throttling: {}\n\
             - Script Name: {}",
            self.host,
            self.http_port,
            self.debug,
            self.log_level,
            self.database.url,
            display_list(&self.security.allowed_hosts),
            display_list(&self.security.cors_allowed_origins),
            display_list(&self.security.csrf_trusted_origins),
            if self.throttle.enabled {
                "Enabled"
            } else {
                "Disabled"
            },
            if self.urls.force_script_name.is_empty() {
                "/"
            } else {
                &self.urls.force_script_name
            },
        )
    }

    /// Configuration for tests: in-memory database, debug on, cheap hashing, no throttling
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            debug: true,
            secret_key: SecretKey::new("test-secret-key"),
            host: defaults::HOST.to_owned(),
            http_port: defaults::HTTP_PORT,
            log_level: LogLevel::Warn,
            database: DatabaseConfig {
                url: DatabaseUrl::Memory,
                max_connections: 1,
            },
            security: SecurityConfig {
                cors_allowed_origins: parse_list(defaults::LOCAL_FRONTEND_ORIGINS),
                csrf_trusted_origins: parse_list(defaults::LOCAL_FRONTEND_ORIGINS),
                allowed_hosts: vec!["testserver".to_owned(), "localhost".to_owned()],
                bcrypt_cost: 4,
                request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            },
            throttle: ThrottleConfig::disabled(),
            urls: UrlConfig {
                force_script_name: String::new(),
                media_url: defaults::MEDIA_URL.to_owned(),
            },
        }
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_rate(key: &str, default: &str) -> Result<ThrottleRate> {
    env_var_or(key, default)
        .parse()
        .with_context(|| format!("Invalid {key} value"))
}

/// Parse a comma-separated list, dropping blanks
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `/coderr/` and `coderr` both become `/coderr`; blank stays blank
fn normalize_script_name(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

fn display_list(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_owned()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list("a.example.com, ,b.example.com,"),
            vec!["a.example.com".to_owned(), "b.example.com".to_owned()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str_or_default("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("nonsense"), LogLevel::Info);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }

    #[test]
    fn test_database_url_parsing() {
        assert_eq!(
            DatabaseUrl::parse_url("sqlite::memory:").ok(),
            Some(DatabaseUrl::Memory)
        );
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:./data/test.db").ok(),
            Some(DatabaseUrl::SQLite {
                path: PathBuf::from("./data/test.db")
            })
        );
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:///var/lib/coderr.db").ok(),
            Some(DatabaseUrl::SQLite {
                path: PathBuf::from("/var/lib/coderr.db")
            })
        );
        assert!(DatabaseUrl::parse_url("postgres://localhost/coderr").is_err());
        assert!(DatabaseUrl::parse_url("mysql://localhost/coderr").is_err());
    }

    #[test]
    fn test_script_name_normalization() {
        assert_eq!(normalize_script_name(""), "");
        assert_eq!(normalize_script_name("/coderr/"), "/coderr");
        assert_eq!(normalize_script_name("coderr"), "/coderr");
    }

    #[test]
    fn test_secret_key_is_not_printed() {
        let config = ServerConfig::for_testing();
        assert!(!format!("{config:?}").contains("test-secret-key"));
        assert!(!config.summary().contains("test-secret-key"));
    }

    #[test]
    fn test_testing_config_is_valid() {
        assert!(ServerConfig::for_testing().validate().is_ok());
    }
}
