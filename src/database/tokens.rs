// ABOUTME: Database operations for opaque authentication tokens
// ABOUTME: Stores keyed token digests and resolves them to the owning account and profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::{to_timestamp, users::parse_profile_type, Database};
use crate::errors::{AppError, AppResult};
use crate::permissions::{Principal, ProfileRef};

/// Account resolved from a presented token
#[derive(Debug, Clone)]
pub struct TokenOwner {
    /// Caller identity for permission checks
    pub principal: Principal,
    /// Inactive accounts are rejected by the authenticator
    pub is_active: bool,
}

impl Database {
    pub(super) async fn migrate_tokens(&self) -> AppResult<()> {
        self.execute_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS auth_tokens (
                digest TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_auth_tokens_user ON auth_tokens(user_id)",
        ])
        .await
    }
}

/// Token storage
#[derive(Clone)]
pub struct TokensManager {
    pool: SqlitePool,
}

impl TokensManager {
    /// Create a new tokens manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a token digest for an account
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn create(&self, digest: &str, user_id: i64) -> AppResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        insert_token(&mut conn, digest, user_id, Utc::now()).await
    }

    /// Resolve a digest to its account, `None` when no token matches
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn find_owner(&self, digest: &str) -> AppResult<Option<TokenOwner>> {
        let row = sqlx::query(
            r"
            SELECT u.id, u.username, u.is_staff, u.is_superuser, u.is_active,
                   p.id AS profile_id, p.type AS profile_type
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            LEFT JOIN user_profiles p ON p.user_id = u.id
            WHERE t.digest = $1
            ",
        )
        .bind(digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to look up token: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let profile_id: Option<i64> = row.try_get("profile_id")?;
        let profile_type: Option<String> = row.try_get("profile_type")?;
        let profile = match (profile_id, profile_type) {
            (Some(id), Some(profile_type)) => Some(ProfileRef {
                id,
                profile_type: parse_profile_type(&profile_type)?,
            }),
            _ => None,
        };
        let is_staff: bool = row.try_get("is_staff")?;
        let is_superuser: bool = row.try_get("is_superuser")?;

        Ok(Some(TokenOwner {
            principal: Principal {
                user_id: row.try_get("id")?,
                username: row.try_get("username")?,
                is_staff: is_staff || is_superuser,
                profile,
            },
            is_active: row.try_get("is_active")?,
        }))
    }

    /// Remove every token of an account
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn revoke_all(&self, user_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to revoke tokens: {e}")))?;
        Ok(result.rows_affected())
    }
}

pub(super) async fn insert_token(
    conn: &mut SqliteConnection,
    digest: &str,
    user_id: i64,
    now: DateTime<Utc>,
) -> AppResult<()> {
    sqlx::query("INSERT INTO auth_tokens (digest, user_id, created_at) VALUES ($1, $2, $3)")
        .bind(digest)
        .bind(user_id)
        .bind(to_timestamp(&now))
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to store token: {e}")))?;
    Ok(())
}
