// ABOUTME: Database operations for offers and their basic/standard/premium packages
// ABOUTME: Handles filtered paginated listing with price and delivery aggregates and nested writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use super::{is_unique_violation, parse_timestamp, to_timestamp, Database};
use crate::constants::messages;
use crate::errors::{AppError, AppResult};
use crate::models::{OfferType, Price};

/// Offer header row
#[derive(Debug, Clone)]
pub struct Offer {
    /// Offer id
    pub id: i64,
    /// Publishing business profile
    pub user_profile_id: i64,
    /// Headline
    pub title: String,
    /// Image path or URL
    pub image: Option<String>,
    /// Long description
    pub description: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// One package of an offer
#[derive(Debug, Clone)]
pub struct OfferDetail {
    /// Package id
    pub id: i64,
    /// Parent offer
    pub offer_id: i64,
    /// Package title
    pub title: String,
    /// Included revisions
    pub revisions: i64,
    /// Delivery time
    pub delivery_time_in_days: i64,
    /// Package price
    pub price: Price,
    /// Feature bullet points
    pub features: Vec<String>,
    /// Tier
    pub offer_type: OfferType,
}

/// Account names of the publishing business
#[derive(Debug, Clone)]
pub struct OfferOwner {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Login name
    pub username: String,
}

/// Offer with its packages and owner, as rendered by the API
#[derive(Debug, Clone)]
pub struct OfferRecord {
    /// Header
    pub offer: Offer,
    /// Packages ordered by id
    pub details: Vec<OfferDetail>,
    /// Publishing account
    pub owner: OfferOwner,
}

impl OfferRecord {
    /// Cheapest package price
    #[must_use]
    pub fn min_price(&self) -> Option<Price> {
        self.details.iter().map(|d| d.price).min()
    }

    /// Fastest package delivery
    #[must_use]
    pub fn min_delivery_time(&self) -> Option<i64> {
        self.details.iter().map(|d| d.delivery_time_in_days).min()
    }
}

/// Complete package for creation
#[derive(Debug, Clone)]
pub struct NewOfferDetail {
    /// Package title
    pub title: String,
    /// Included revisions
    pub revisions: i64,
    /// Delivery time
    pub delivery_time_in_days: i64,
    /// Package price
    pub price: Price,
    /// Feature bullet points
    pub features: Vec<String>,
    /// Tier
    pub offer_type: OfferType,
}

/// Complete offer for creation
#[derive(Debug, Clone)]
pub struct NewOffer {
    /// Headline
    pub title: String,
    /// Image path or URL
    pub image: Option<String>,
    /// Long description
    pub description: String,
    /// Packages
    pub details: Vec<NewOfferDetail>,
}

/// Package entry of an update, matched against existing packages by tier
#[derive(Debug, Clone, Default)]
pub struct DetailChange {
    /// Tier used for matching
    pub offer_type: Option<OfferType>,
    /// Package title
    pub title: Option<String>,
    /// Included revisions
    pub revisions: Option<i64>,
    /// Delivery time
    pub delivery_time_in_days: Option<i64>,
    /// Package price
    pub price: Option<Price>,
    /// Feature bullet points
    pub features: Option<Vec<String>>,
}

impl DetailChange {
    /// Complete package when every field is present
    #[must_use]
    pub fn into_new(self) -> Option<NewOfferDetail> {
        Some(NewOfferDetail {
            title: self.title?,
            revisions: self.revisions?,
            delivery_time_in_days: self.delivery_time_in_days?,
            price: self.price?,
            features: self.features?,
            offer_type: self.offer_type?,
        })
    }
}

/// Partial offer update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct OfferChanges {
    /// Headline
    pub title: Option<String>,
    /// Image; `Some(None)` clears it
    pub image: Option<Option<String>>,
    /// Long description
    pub description: Option<String>,
    /// Package upserts keyed by tier
    pub details: Option<Vec<DetailChange>>,
}

/// Sortable offer list columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfferOrderField {
    /// Last modification time
    #[default]
    UpdatedAt,
    /// Cheapest package price
    MinPrice,
}

impl OfferOrderField {
    /// Parse an `ordering` parameter term
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "updated_at" => Some(Self::UpdatedAt),
            "min_price" => Some(Self::MinPrice),
            _ => None,
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::UpdatedAt => "o.updated_at",
            Self::MinPrice => "min_price_cents",
        }
    }
}

/// Offer list filters
#[derive(Debug, Clone, Default)]
pub struct OfferQuery {
    /// Publishing profile
    pub creator_id: Option<i64>,
    /// Upper bound on the fastest package delivery
    pub max_delivery_time: Option<f64>,
    /// Lower bound on the cheapest package price
    pub min_price: Option<f64>,
    /// Every term must occur in the title or description
    pub search_terms: Vec<String>,
    /// Sort column and direction (`true` for descending)
    pub ordering: (OfferOrderField, bool),
}

impl OfferQuery {
    fn push_filtered_ids(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder.push(
            "SELECT o.id, MIN(d.price_cents) AS min_price_cents, \
             MIN(d.delivery_time_in_days) AS min_delivery_time, o.updated_at \
             FROM offers o LEFT JOIN offer_details d ON d.offer_id = o.id WHERE 1 = 1",
        );
        if let Some(creator_id) = self.creator_id {
            builder.push(" AND o.user_profile_id = ").push_bind(creator_id);
        }
        for term in &self.search_terms {
            let pattern = format!("%{}%", escape_like(term));
            builder
                .push(" AND (o.title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR o.description LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        builder.push(" GROUP BY o.id HAVING 1 = 1");
        if let Some(max_delivery) = self.max_delivery_time {
            builder
                .push(" AND MIN(d.delivery_time_in_days) <= ")
                .push_bind(max_delivery);
        }
        if let Some(min_price) = self.min_price {
            builder
                .push(" AND MIN(d.price_cents) >= ")
                .push_bind(min_price * 100.0);
        }
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Database {
    pub(super) async fn migrate_offers(&self) -> AppResult<()> {
        self.execute_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS offers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_profile_id INTEGER NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                image TEXT,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_offers_profile ON offers(user_profile_id)",
            r"
            CREATE TABLE IF NOT EXISTS offer_details (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                offer_id INTEGER NOT NULL REFERENCES offers(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                revisions INTEGER NOT NULL,
                delivery_time_in_days INTEGER NOT NULL CHECK (delivery_time_in_days >= 1),
                price_cents INTEGER NOT NULL,
                features TEXT NOT NULL DEFAULT '[]',
                offer_type TEXT NOT NULL CHECK (offer_type IN ('basic', 'standard', 'premium')),
                UNIQUE (offer_id, offer_type)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_offer_details_offer ON offer_details(offer_id)",
        ])
        .await
    }
}

/// Offer storage
#[derive(Clone)]
pub struct OffersManager {
    pool: SqlitePool,
}

impl OffersManager {
    /// Create a new offers manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of offers matching the filters
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn count(&self, query: &OfferQuery) -> AppResult<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM (");
        query.push_filtered_ids(&mut builder);
        builder.push(")");
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count offers: {e}")))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// One page of offers matching the filters
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(
        &self,
        query: &OfferQuery,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<OfferRecord>> {
        let mut builder = QueryBuilder::<Sqlite>::new("");
        query.push_filtered_ids(&mut builder);
        let (field, descending) = query.ordering;
        let direction = if descending { "DESC" } else { "ASC" };
        builder
            .push(format!(" ORDER BY {} {direction}, o.id {direction}", field.column()))
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let ids: Vec<i64> = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list offers: {e}")))?
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<Result<_, _>>()?;

        self.load_records(&ids).await
    }

    /// One offer with packages and owner
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, offer_id: i64) -> AppResult<Option<OfferRecord>> {
        Ok(self.load_records(&[offer_id]).await?.into_iter().next())
    }

    /// One package by id
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_detail(&self, detail_id: i64) -> AppResult<Option<OfferDetail>> {
        let row = sqlx::query(
            r"
            SELECT id, offer_id, title, revisions, delivery_time_in_days, price_cents, features, offer_type
            FROM offer_details WHERE id = $1
            ",
        )
        .bind(detail_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get offer detail: {e}")))?;

        row.map(|r| row_to_detail(&r)).transpose()
    }

    /// Create an offer and all of its packages atomically
    ///
    /// # Errors
    ///
    /// Returns `Create Detail failed.` when two packages share a tier, or a database error
    pub async fn create(&self, user_profile_id: i64, new_offer: &NewOffer) -> AppResult<i64> {
        let now = to_timestamp(&Utc::now());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let offer_id = sqlx::query(
            r"
            INSERT INTO offers (user_profile_id, title, image, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ",
        )
        .bind(user_profile_id)
        .bind(&new_offer.title)
        .bind(&new_offer.image)
        .bind(&new_offer.description)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create offer: {e}")))?
        .last_insert_rowid();

        for detail in &new_offer.details {
            insert_detail(&mut tx, offer_id, detail).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit offer: {e}")))?;
        Ok(offer_id)
    }

    /// Apply a partial update; packages are upserted by tier
    ///
    /// # Errors
    ///
    /// Returns `Create Detail failed.` when a new tier is incomplete or duplicated, or a
    /// database error
    pub async fn update(&self, offer: &Offer, changes: OfferChanges) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            UPDATE offers SET title = $1, image = $2, description = $3, updated_at = $4
            WHERE id = $5
            ",
        )
        .bind(changes.title.as_ref().unwrap_or(&offer.title))
        .bind(changes.image.as_ref().unwrap_or(&offer.image))
        .bind(changes.description.as_ref().unwrap_or(&offer.description))
        .bind(to_timestamp(&Utc::now()))
        .bind(offer.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update offer: {e}")))?;

        if let Some(detail_changes) = changes.details {
            let existing = existing_detail_ids(&mut tx, offer.id).await?;
            for change in detail_changes {
                match change.offer_type.and_then(|t| existing.get(&t).copied()) {
                    Some(detail_id) => update_detail(&mut tx, detail_id, &change).await?,
                    None => {
                        let detail = change
                            .into_new()
                            .ok_or_else(|| AppError::invalid_input(messages::CREATE_DETAIL_FAILED))?;
                        insert_detail(&mut tx, offer.id, &detail).await?;
                    }
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit offer update: {e}")))?;
        Ok(())
    }

    /// Delete an offer; packages and their orders cascade
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, offer_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(offer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete offer: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_records(&self, ids: &[i64]) -> AppResult<Vec<OfferRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT o.id, o.user_profile_id, o.title, o.image, o.description, o.created_at, \
             o.updated_at, u.first_name, u.last_name, u.username \
             FROM offers o \
             JOIN user_profiles p ON p.id = o.user_profile_id \
             JOIN users u ON u.id = p.user_id \
             WHERE o.id IN (",
        );
        push_id_list(&mut builder, ids);
        let offer_rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load offers: {e}")))?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, offer_id, title, revisions, delivery_time_in_days, price_cents, features, \
             offer_type FROM offer_details WHERE offer_id IN (",
        );
        push_id_list(&mut builder, ids);
        builder.push(" ORDER BY id");
        let detail_rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load offer details: {e}")))?;

        let mut details_by_offer: HashMap<i64, Vec<OfferDetail>> = HashMap::new();
        for row in &detail_rows {
            let detail = row_to_detail(row)?;
            details_by_offer.entry(detail.offer_id).or_default().push(detail);
        }

        let mut records: HashMap<i64, OfferRecord> = HashMap::with_capacity(offer_rows.len());
        for row in &offer_rows {
            let offer = row_to_offer(row)?;
            let owner = OfferOwner {
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                username: row.try_get("username")?,
            };
            let details = details_by_offer.remove(&offer.id).unwrap_or_default();
            records.insert(offer.id, OfferRecord { offer, details, owner });
        }

        // Preserve the caller's ordering
        Ok(ids.iter().filter_map(|id| records.remove(id)).collect())
    }
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

async fn existing_detail_ids(
    conn: &mut SqliteConnection,
    offer_id: i64,
) -> AppResult<HashMap<OfferType, i64>> {
    let rows = sqlx::query("SELECT id, offer_type FROM offer_details WHERE offer_id = $1")
        .bind(offer_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to load offer details: {e}")))?;

    let mut existing = HashMap::with_capacity(rows.len());
    for row in &rows {
        let offer_type: String = row.try_get("offer_type")?;
        existing.insert(parse_offer_type(&offer_type)?, row.try_get("id")?);
    }
    Ok(existing)
}

async fn insert_detail(
    conn: &mut SqliteConnection,
    offer_id: i64,
    detail: &NewOfferDetail,
) -> AppResult<i64> {
    let features = serde_json::to_string(&detail.features)?;
    let result = sqlx::query(
        r"
        INSERT INTO offer_details
            (offer_id, title, revisions, delivery_time_in_days, price_cents, features, offer_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(offer_id)
    .bind(&detail.title)
    .bind(detail.revisions)
    .bind(detail.delivery_time_in_days)
    .bind(detail.price.cents())
    .bind(features)
    .bind(detail.offer_type.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::invalid_input(messages::CREATE_DETAIL_FAILED)
        } else {
            AppError::database(format!("Failed to create offer detail: {e}"))
        }
    })?;
    Ok(result.last_insert_rowid())
}

async fn update_detail(
    conn: &mut SqliteConnection,
    detail_id: i64,
    change: &DetailChange,
) -> AppResult<()> {
    let features = change
        .features
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    sqlx::query(
        r"
        UPDATE offer_details SET
            title = COALESCE($1, title),
            revisions = COALESCE($2, revisions),
            delivery_time_in_days = COALESCE($3, delivery_time_in_days),
            price_cents = COALESCE($4, price_cents),
            features = COALESCE($5, features)
        WHERE id = $6
        ",
    )
    .bind(&change.title)
    .bind(change.revisions)
    .bind(change.delivery_time_in_days)
    .bind(change.price.map(Price::cents))
    .bind(features)
    .bind(detail_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to update offer detail: {e}")))?;
    Ok(())
}

fn parse_offer_type(value: &str) -> AppResult<OfferType> {
    OfferType::parse(value)
        .ok_or_else(|| AppError::internal(format!("Invalid offer type in database: {value}")))
}

fn row_to_offer(row: &SqliteRow) -> AppResult<Offer> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Offer {
        id: row.try_get("id")?,
        user_profile_id: row.try_get("user_profile_id")?,
        title: row.try_get("title")?,
        image: row.try_get("image")?,
        description: row.try_get("description")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub(super) fn row_to_detail(row: &SqliteRow) -> AppResult<OfferDetail> {
    let features: String = row.try_get("features")?;
    let offer_type: String = row.try_get("offer_type")?;
    Ok(OfferDetail {
        id: row.try_get("id")?,
        offer_id: row.try_get("offer_id")?,
        title: row.try_get("title")?,
        revisions: row.try_get("revisions")?,
        delivery_time_in_days: row.try_get("delivery_time_in_days")?,
        price: Price::from_cents(row.try_get("price_cents")?),
        features: serde_json::from_str(&features)?,
        offer_type: parse_offer_type(&offer_type)?,
    })
}
