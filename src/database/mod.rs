// ABOUTME: SQLite connection pool, schema migrations, and per-domain storage managers
// ABOUTME: Entry point for users, tokens, offers, orders, reviews, and aggregate statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! # Database Management
//!
//! Storage for the marketplace. [`Database`] owns the `sqlx` pool and runs the
//! idempotent schema migrations; each domain has a small manager (`UsersManager`,
//! `OffersManager`, ...) that borrows a clone of the pool.
//!
//! Timestamps are stored as RFC 3339 text with microsecond precision so that
//! lexicographic order matches chronological order.

mod offers;
mod orders;
mod reviews;
mod stats;
mod tokens;
mod users;

pub use offers::{
    DetailChange, NewOffer, NewOfferDetail, Offer, OfferChanges, OfferDetail, OfferOrderField,
    OfferOwner, OfferQuery, OfferRecord, OffersManager,
};
pub use orders::{OrderRecord, OrdersManager};
pub use reviews::{Review, ReviewChanges, ReviewOrderField, ReviewQuery, ReviewsManager};
pub use stats::{BaseInfo, StatsManager};
pub use tokens::{TokenOwner, TokensManager};
pub use users::{NewUser, ProfileAccount, ProfileChanges, User, UserProfile, UsersManager};

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Error as SqlxError, SqlitePool};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, AppResult};

/// Database handle shared by all request handlers
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool described by `config` and run migrations
    ///
    /// File databases are created when missing. In-memory databases are pinned to a
    /// single connection that never expires, since every `SQLite` memory connection
    /// is a separate database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or a migration fails
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        let connection_string = config.url.to_connection_string();
        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if config.url.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .acquire_timeout(Duration::from_secs(10))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!(url = %config.url, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any schema statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_tokens().await?;
        self.migrate_offers().await?;
        self.migrate_orders().await?;
        self.migrate_reviews().await?;
        debug!("Database migrations complete");
        Ok(())
    }

    /// Cheap round trip used by the readiness probe
    ///
    /// # Errors
    ///
    /// Returns an error if the database does not answer
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// Accounts, profiles, and registration
    #[must_use]
    pub fn users(&self) -> UsersManager {
        UsersManager::new(self.pool.clone())
    }

    /// Authentication tokens
    #[must_use]
    pub fn tokens(&self) -> TokensManager {
        TokensManager::new(self.pool.clone())
    }

    /// Offers and their packages
    #[must_use]
    pub fn offers(&self) -> OffersManager {
        OffersManager::new(self.pool.clone())
    }

    /// Orders
    #[must_use]
    pub fn orders(&self) -> OrdersManager {
        OrdersManager::new(self.pool.clone())
    }

    /// Reviews
    #[must_use]
    pub fn reviews(&self) -> ReviewsManager {
        ReviewsManager::new(self.pool.clone())
    }

    /// Landing-page aggregates
    #[must_use]
    pub fn stats(&self) -> StatsManager {
        StatsManager::new(self.pool.clone())
    }

    async fn execute_schema(&self, statements: &[&str]) -> AppResult<()> {
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        }
        Ok(())
    }
}

/// Render a timestamp for storage
pub(crate) fn to_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub(crate) fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))
}

/// Whether a query failed on a UNIQUE constraint
pub(crate) fn is_unique_violation(error: &SqlxError) -> bool {
    matches!(error, SqlxError::Database(db) if db.is_unique_violation())
}
