// ABOUTME: Database operations for customer reviews of business profiles
// ABOUTME: Enforces one review per customer and business pair through a unique constraint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

use super::{is_unique_violation, parse_timestamp, to_timestamp, Database};
use crate::constants::messages;
use crate::errors::{AppError, AppResult};

const REVIEW_COLUMNS: &str =
    "id, business_profile_id, reviewer_profile_id, rating, description, created_at, updated_at";

/// Rating of a business by a customer
#[derive(Debug, Clone)]
pub struct Review {
    /// Review id
    pub id: i64,
    /// Reviewed business profile
    pub business_profile_id: i64,
    /// Authoring customer profile
    pub reviewer_profile_id: i64,
    /// Stars, 1 to 5
    pub rating: i64,
    /// Free text
    pub description: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Partial review update
#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    /// New rating
    pub rating: Option<i64>,
    /// New text
    pub description: Option<String>,
}

/// Sortable review columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOrderField {
    /// Last modification time
    UpdatedAt,
    /// Stars
    Rating,
}

impl ReviewOrderField {
    /// Parse an `ordering` parameter term
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "updated_at" => Some(Self::UpdatedAt),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::UpdatedAt => "updated_at",
            Self::Rating => "rating",
        }
    }
}

/// Review list filters
#[derive(Debug, Clone)]
pub struct ReviewQuery {
    /// Reviewed business profile
    pub business_user_id: Option<i64>,
    /// Authoring customer profile
    pub reviewer_id: Option<i64>,
    /// Sort column and direction (`true` for descending)
    pub ordering: (ReviewOrderField, bool),
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self {
            business_user_id: None,
            reviewer_id: None,
            ordering: (ReviewOrderField::UpdatedAt, true),
        }
    }
}

impl Database {
    pub(super) async fn migrate_reviews(&self) -> AppResult<()> {
        self.execute_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                business_profile_id INTEGER NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
                reviewer_profile_id INTEGER NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (business_profile_id, reviewer_profile_id)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_reviews_reviewer ON reviews(reviewer_profile_id)",
        ])
        .await
    }
}

/// Review storage
#[derive(Clone)]
pub struct ReviewsManager {
    pool: SqlitePool,
}

impl ReviewsManager {
    /// Create a new reviews manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Filtered, ordered reviews
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, query: &ReviewQuery) -> AppResult<Vec<Review>> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE 1 = 1"));
        if let Some(business_id) = query.business_user_id {
            builder.push(" AND business_profile_id = ").push_bind(business_id);
        }
        if let Some(reviewer_id) = query.reviewer_id {
            builder.push(" AND reviewer_profile_id = ").push_bind(reviewer_id);
        }
        let (field, descending) = query.ordering;
        let direction = if descending { "DESC" } else { "ASC" };
        builder.push(format!(" ORDER BY {} {direction}, id {direction}", field.column()));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list reviews: {e}")))?;

        rows.iter().map(row_to_review).collect()
    }

    /// One review by id
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, review_id: i64) -> AppResult<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get review: {e}")))?;

        row.map(|r| row_to_review(&r)).transpose()
    }

    /// Whether the reviewer already reviewed the business
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn exists_for_pair(
        &self,
        business_profile_id: i64,
        reviewer_profile_id: i64,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS(
                SELECT 1 FROM reviews WHERE business_profile_id = $1 AND reviewer_profile_id = $2
            )
            ",
        )
        .bind(business_profile_id)
        .bind(reviewer_profile_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check review: {e}")))?;
        Ok(exists)
    }

    /// Store a review
    ///
    /// # Errors
    ///
    /// Returns the duplicate-review error when the pair already has a review, or a
    /// database error
    pub async fn create(
        &self,
        business_profile_id: i64,
        reviewer_profile_id: i64,
        rating: i64,
        description: &str,
    ) -> AppResult<Review> {
        let now = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO reviews
                (business_profile_id, reviewer_profile_id, rating, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ",
        )
        .bind(business_profile_id)
        .bind(reviewer_profile_id)
        .bind(rating)
        .bind(description)
        .bind(to_timestamp(&now))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::invalid_input(messages::DUPLICATE_REVIEW)
            } else {
                AppError::database(format!("Failed to create review: {e}"))
            }
        })?;

        Ok(Review {
            id: result.last_insert_rowid(),
            business_profile_id,
            reviewer_profile_id,
            rating,
            description: description.to_owned(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update and bump the modification time
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update(&self, review: &Review, changes: &ReviewChanges) -> AppResult<Review> {
        let now = Utc::now();
        let rating = changes.rating.unwrap_or(review.rating);
        let description = changes
            .description
            .clone()
            .unwrap_or_else(|| review.description.clone());

        sqlx::query("UPDATE reviews SET rating = $1, description = $2, updated_at = $3 WHERE id = $4")
            .bind(rating)
            .bind(&description)
            .bind(to_timestamp(&now))
            .bind(review.id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update review: {e}")))?;

        Ok(Review {
            rating,
            description,
            updated_at: now,
            ..review.clone()
        })
    }

    /// Delete a review
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, review_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete review: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_review(row: &SqliteRow) -> AppResult<Review> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Review {
        id: row.try_get("id")?,
        business_profile_id: row.try_get("business_profile_id")?,
        reviewer_profile_id: row.try_get("reviewer_profile_id")?,
        rating: row.try_get("rating")?,
        description: row.try_get("description")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
