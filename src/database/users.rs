// ABOUTME: Database operations for user accounts and marketplace profiles
// ABOUTME: Handles atomic registration, credential lookup, and profile reads and updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

use super::{is_unique_violation, parse_timestamp, to_timestamp, tokens, Database};
use crate::constants::messages;
use crate::errors::{AppError, AppResult};
use crate::models::ProfileType;

const USER_COLUMNS: &str = "u.id AS user_id, u.username, u.email, u.first_name, u.last_name, \
    u.password_hash, u.is_staff, u.is_superuser, u.is_active, u.date_joined";

const PROFILE_COLUMNS: &str = "p.id AS profile_id, p.user_id AS profile_user_id, p.type, p.file, \
    p.location, p.tel, p.description, p.working_hours, p.created_at AS profile_created_at";

/// Login account
#[derive(Debug, Clone)]
pub struct User {
    /// Account id
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// Back-office access
    pub is_staff: bool,
    /// Unrestricted back-office access
    pub is_superuser: bool,
    /// Disabled accounts cannot log in or use tokens
    pub is_active: bool,
    /// Registration time
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Staff or superuser
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

/// Marketplace profile attached one-to-one to an account
#[derive(Debug, Clone)]
pub struct UserProfile {
    /// Profile id, exposed as `user` in the API
    pub id: i64,
    /// Owning account
    pub user_id: i64,
    /// Customer or business
    pub profile_type: ProfileType,
    /// Media path of the profile picture
    pub file: Option<String>,
    /// Free-text location
    pub location: String,
    /// Phone number
    pub tel: String,
    /// Free-text description
    pub description: String,
    /// Free-text availability
    pub working_hours: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Profile joined with its account
#[derive(Debug, Clone)]
pub struct ProfileAccount {
    /// The profile
    pub profile: UserProfile,
    /// The owning account
    pub user: User,
}

/// Input for account creation
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// Unique login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Pre-computed bcrypt hash
    pub password_hash: String,
    /// Back-office access
    pub is_staff: bool,
    /// Unrestricted back-office access
    pub is_superuser: bool,
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    /// Account given name
    pub first_name: Option<String>,
    /// Account family name
    pub last_name: Option<String>,
    /// Account email
    pub email: Option<String>,
    /// Profile type
    pub profile_type: Option<ProfileType>,
    /// Profile picture path; `Some(None)` clears it
    pub file: Option<Option<String>>,
    /// Location
    pub location: Option<String>,
    /// Phone number
    pub tel: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Availability
    pub working_hours: Option<String>,
}

impl ProfileChanges {
    const fn touches_user(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some() || self.email.is_some()
    }
}

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        self.execute_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL DEFAULT '',
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                password_hash TEXT NOT NULL,
                is_staff INTEGER NOT NULL DEFAULT 0,
                is_superuser INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                date_joined TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
            r"
            CREATE TABLE IF NOT EXISTS user_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                type TEXT NOT NULL CHECK (type IN ('customer', 'business')),
                file TEXT,
                location TEXT NOT NULL DEFAULT '',
                tel TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                working_hours TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_user_profiles_type ON user_profiles(type)",
        ])
        .await
    }
}

/// Account and profile storage
#[derive(Clone)]
pub struct UsersManager {
    pool: SqlitePool,
}

impl UsersManager {
    /// Create a new users manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether an account with this username exists
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check username: {e}")))?;
        Ok(exists)
    }

    /// Whether an account with this email exists
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check email: {e}")))?;
        Ok(exists)
    }

    /// Create an account, its optional profile, and its optional first token in one transaction
    ///
    /// # Errors
    ///
    /// Returns a `username` field error when the username is taken, or a database error
    pub async fn create(
        &self,
        new_user: &NewUser,
        profile_type: Option<ProfileType>,
        token_digest: Option<&str>,
    ) -> AppResult<(User, Option<UserProfile>)> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let user = insert_user(&mut tx, new_user, now).await?;
        let profile = match profile_type {
            Some(profile_type) => Some(insert_profile(&mut tx, user.id, profile_type, now).await?),
            None => None,
        };
        if let Some(digest) = token_digest {
            tokens::insert_token(&mut tx, digest, user.id, now).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit registration: {e}")))?;
        Ok((user, profile))
    }

    /// Find an account by username
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = $1");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// The profile owned by an account
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_profile_for_user(&self, user_id: i64) -> AppResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles p WHERE p.user_id = $1");
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        row.map(|r| row_to_profile(&r)).transpose()
    }

    /// A profile and its account by profile id
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_profile(&self, profile_id: i64) -> AppResult<Option<ProfileAccount>> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS}, {USER_COLUMNS}
             FROM user_profiles p JOIN users u ON u.id = p.user_id
             WHERE p.id = $1"
        );
        let row = sqlx::query(&sql)
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        row.map(|r| row_to_profile_account(&r)).transpose()
    }

    /// Type of a profile, `None` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn profile_type(&self, profile_id: i64) -> AppResult<Option<ProfileType>> {
        let value: Option<String> = sqlx::query_scalar("SELECT type FROM user_profiles WHERE id = $1")
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get profile type: {e}")))?;

        value.map(|v| parse_profile_type(&v)).transpose()
    }

    /// All profiles of one type, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_profiles(&self, profile_type: ProfileType) -> AppResult<Vec<ProfileAccount>> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS}, {USER_COLUMNS}
             FROM user_profiles p JOIN users u ON u.id = p.user_id
             WHERE p.type = $1
             ORDER BY p.id"
        );
        let rows = sqlx::query(&sql)
            .bind(profile_type.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list profiles: {e}")))?;

        rows.iter().map(row_to_profile_account).collect()
    }

    /// Apply a partial update to a profile and its account
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update_profile(
        &self,
        account: &ProfileAccount,
        changes: &ProfileChanges,
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        if changes.touches_user() {
            sqlx::query(
                r"
                UPDATE users SET first_name = $1, last_name = $2, email = $3
                WHERE id = $4
                ",
            )
            .bind(changes.first_name.as_ref().unwrap_or(&account.user.first_name))
            .bind(changes.last_name.as_ref().unwrap_or(&account.user.last_name))
            .bind(changes.email.as_ref().unwrap_or(&account.user.email))
            .bind(account.user.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to update user: {e}")))?;
        }

        let profile = &account.profile;
        sqlx::query(
            r"
            UPDATE user_profiles
            SET type = $1, file = $2, location = $3, tel = $4, description = $5, working_hours = $6
            WHERE id = $7
            ",
        )
        .bind(changes.profile_type.unwrap_or(profile.profile_type).as_str())
        .bind(changes.file.as_ref().unwrap_or(&profile.file))
        .bind(changes.location.as_ref().unwrap_or(&profile.location))
        .bind(changes.tel.as_ref().unwrap_or(&profile.tel))
        .bind(changes.description.as_ref().unwrap_or(&profile.description))
        .bind(changes.working_hours.as_ref().unwrap_or(&profile.working_hours))
        .bind(profile.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit profile update: {e}")))?;
        Ok(())
    }
}

async fn insert_user(
    conn: &mut SqliteConnection,
    new_user: &NewUser,
    now: DateTime<Utc>,
) -> AppResult<User> {
    let result = sqlx::query(
        r"
        INSERT INTO users (username, email, password_hash, is_staff, is_superuser, is_active, date_joined)
        VALUES ($1, $2, $3, $4, $5, 1, $6)
        ",
    )
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.is_staff)
    .bind(new_user.is_superuser)
    .bind(to_timestamp(&now))
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::field("username", messages::USERNAME_EXISTS)
        } else {
            AppError::database(format!("Failed to create user: {e}"))
        }
    })?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: new_user.username.clone(),
        email: new_user.email.clone(),
        first_name: String::new(),
        last_name: String::new(),
        password_hash: new_user.password_hash.clone(),
        is_staff: new_user.is_staff,
        is_superuser: new_user.is_superuser,
        is_active: true,
        date_joined: now,
    })
}

async fn insert_profile(
    conn: &mut SqliteConnection,
    user_id: i64,
    profile_type: ProfileType,
    now: DateTime<Utc>,
) -> AppResult<UserProfile> {
    let result = sqlx::query(
        "INSERT INTO user_profiles (user_id, type, created_at) VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(profile_type.as_str())
    .bind(to_timestamp(&now))
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to create profile: {e}")))?;

    Ok(UserProfile {
        id: result.last_insert_rowid(),
        user_id,
        profile_type,
        file: None,
        location: String::new(),
        tel: String::new(),
        description: String::new(),
        working_hours: String::new(),
        created_at: now,
    })
}

pub(super) fn parse_profile_type(value: &str) -> AppResult<ProfileType> {
    ProfileType::parse(value)
        .ok_or_else(|| AppError::internal(format!("Invalid profile type in database: {value}")))
}

/// Convert a row selected with `USER_COLUMNS` to a User
fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let date_joined: String = row.try_get("date_joined")?;
    Ok(User {
        id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        password_hash: row.try_get("password_hash")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        is_active: row.try_get("is_active")?,
        date_joined: parse_timestamp(&date_joined)?,
    })
}

/// Convert a row selected with `PROFILE_COLUMNS` to a `UserProfile`
fn row_to_profile(row: &SqliteRow) -> AppResult<UserProfile> {
    let profile_type: String = row.try_get("type")?;
    let created_at: String = row.try_get("profile_created_at")?;
    Ok(UserProfile {
        id: row.try_get("profile_id")?,
        user_id: row.try_get("profile_user_id")?,
        profile_type: parse_profile_type(&profile_type)?,
        file: row.try_get("file")?,
        location: row.try_get("location")?,
        tel: row.try_get("tel")?,
        description: row.try_get("description")?,
        working_hours: row.try_get("working_hours")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_profile_account(row: &SqliteRow) -> AppResult<ProfileAccount> {
    Ok(ProfileAccount {
        profile: row_to_profile(row)?,
        user: row_to_user(row)?,
    })
}
