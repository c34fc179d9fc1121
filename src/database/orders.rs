// ABOUTME: Database operations for package orders and their status lifecycle
// ABOUTME: Lists orders per customer or business and counts orders per status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{offers::row_to_detail, parse_timestamp, to_timestamp, Database, OfferDetail};
use crate::errors::{AppError, AppResult};
use crate::models::OrderStatus;
use crate::permissions::OrderParties;

const ORDER_SELECT: &str = r"
    SELECT ord.id AS order_id, ord.customer_profile_id, ord.status,
           ord.created_at AS order_created_at, ord.updated_at AS order_updated_at,
           o.user_profile_id AS business_profile_id,
           d.id, d.offer_id, d.title, d.revisions, d.delivery_time_in_days, d.price_cents,
           d.features, d.offer_type
    FROM orders ord
    JOIN offer_details d ON d.id = ord.offer_detail_id
    JOIN offers o ON o.id = d.offer_id
";

/// Order with the ordered package and both parties
#[derive(Debug, Clone)]
pub struct OrderRecord {
    /// Order id
    pub id: i64,
    /// Ordering profile
    pub customer_profile_id: i64,
    /// Profile owning the ordered offer
    pub business_profile_id: i64,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Placement time
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
    /// The ordered package
    pub detail: OfferDetail,
}

impl OrderRecord {
    /// Both parties for access checks
    #[must_use]
    pub const fn parties(&self) -> OrderParties {
        OrderParties {
            customer_profile_id: self.customer_profile_id,
            business_profile_id: self.business_profile_id,
        }
    }
}

impl Database {
    pub(super) async fn migrate_orders(&self) -> AppResult<()> {
        self.execute_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_profile_id INTEGER NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
                offer_detail_id INTEGER NOT NULL REFERENCES offer_details(id) ON DELETE CASCADE,
                status TEXT NOT NULL DEFAULT 'in_progress'
                    CHECK (status IN ('in_progress', 'completed', 'cancelled')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_profile_id)",
            "CREATE INDEX IF NOT EXISTS idx_orders_detail ON orders(offer_detail_id)",
        ])
        .await
    }
}

/// Order storage
#[derive(Clone)]
pub struct OrdersManager {
    pool: SqlitePool,
}

impl OrdersManager {
    /// Create a new orders manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Place an order for a package, `None` when the package does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn create(
        &self,
        customer_profile_id: i64,
        offer_detail_id: i64,
    ) -> AppResult<Option<OrderRecord>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM offer_details WHERE id = $1)")
                .bind(offer_detail_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to check offer detail: {e}")))?;
        if !exists {
            return Ok(None);
        }

        let now = to_timestamp(&Utc::now());
        let order_id = sqlx::query(
            r"
            INSERT INTO orders (customer_profile_id, offer_detail_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ",
        )
        .bind(customer_profile_id)
        .bind(offer_detail_id)
        .bind(OrderStatus::default().as_str())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create order: {e}")))?
        .last_insert_rowid();

        self.get(order_id).await
    }

    /// One order by id
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, order_id: i64) -> AppResult<Option<OrderRecord>> {
        let sql = format!("{ORDER_SELECT} WHERE ord.id = $1");
        let row = sqlx::query(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get order: {e}")))?;

        row.map(|r| row_to_order(&r)).transpose()
    }

    /// Orders placed by a profile, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_for_customer(&self, profile_id: i64) -> AppResult<Vec<OrderRecord>> {
        self.list_where("ord.customer_profile_id = $1", profile_id)
            .await
    }

    /// Orders on a business's offers, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_for_business(&self, profile_id: i64) -> AppResult<Vec<OrderRecord>> {
        self.list_where("o.user_profile_id = $1", profile_id).await
    }

    async fn list_where(&self, condition: &str, profile_id: i64) -> AppResult<Vec<OrderRecord>> {
        let sql = format!("{ORDER_SELECT} WHERE {condition} ORDER BY ord.created_at DESC, ord.id DESC");
        let rows = sqlx::query(&sql)
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list orders: {e}")))?;

        rows.iter().map(row_to_order).collect()
    }

    /// Change an order's status and bump its modification time
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> AppResult<Option<OrderRecord>> {
        sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(to_timestamp(&Utc::now()))
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update order: {e}")))?;

        self.get(order_id).await
    }

    /// Delete an order
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, order_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete order: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Orders with `status` on the offers of a business profile
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn count_for_business(
        &self,
        business_profile_id: i64,
        status: OrderStatus,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM orders ord
            JOIN offer_details d ON d.id = ord.offer_detail_id
            JOIN offers o ON o.id = d.offer_id
            WHERE o.user_profile_id = $1 AND ord.status = $2
            ",
        )
        .bind(business_profile_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count orders: {e}")))?;
        Ok(count)
    }
}

fn row_to_order(row: &SqliteRow) -> AppResult<OrderRecord> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("order_created_at")?;
    let updated_at: String = row.try_get("order_updated_at")?;
    Ok(OrderRecord {
        id: row.try_get("order_id")?,
        customer_profile_id: row.try_get("customer_profile_id")?,
        business_profile_id: row.try_get("business_profile_id")?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| AppError::internal(format!("Invalid order status in database: {status}")))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        detail: row_to_detail(row)?,
    })
}
