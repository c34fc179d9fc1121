// ABOUTME: Aggregate marketplace statistics for the landing page
// ABOUTME: Counts reviews, business profiles, and offers and averages ratings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::errors::{AppError, AppResult};
use crate::models::ProfileType;

/// Landing-page figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseInfo {
    /// Number of reviews
    pub review_count: i64,
    /// Mean rating rounded to one decimal, `0.0` without reviews
    pub average_rating: f64,
    /// Number of business profiles
    pub business_profile_count: i64,
    /// Number of offers
    pub offer_count: i64,
}

/// Aggregate queries
#[derive(Clone)]
pub struct StatsManager {
    pool: SqlitePool,
}

impl StatsManager {
    /// Create a new stats manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Compute the landing-page figures
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn base_info(&self) -> AppResult<BaseInfo> {
        let row = sqlx::query(
            r"
            SELECT
                (SELECT COUNT(*) FROM reviews) AS review_count,
                (SELECT AVG(rating) FROM reviews) AS average_rating,
                (SELECT COUNT(*) FROM user_profiles WHERE type = $1) AS business_profile_count,
                (SELECT COUNT(*) FROM offers) AS offer_count
            ",
        )
        .bind(ProfileType::Business.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute base info: {e}")))?;

        let average: Option<f64> = row.try_get("average_rating")?;
        Ok(BaseInfo {
            review_count: row.try_get("review_count")?,
            average_rating: average.map_or(0.0, round_one_decimal),
            business_profile_count: row.try_get("business_profile_count")?,
            offer_count: row.try_get("offer_count")?,
        })
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
