// ABOUTME: Offer route handlers for browsing, publishing, editing, and removing service offers
// ABOUTME: Handles nested package validation, list filters, ordering, and page-number pagination
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! Offer routes
//!
//! Offers are public to browse as a paginated list. Reading a single offer or package
//! requires authentication, and only the publishing business may change an offer.
//! List items link to their packages, while create and update responses embed the
//! full packages.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use url::form_urlencoded;

use crate::constants::{limits, messages, pagination};
use crate::database::{
    DetailChange, NewOffer, NewOfferDetail, OfferChanges, OfferDetail, OfferOrderField,
    OfferQuery, OfferRecord,
};
use crate::errors::{AppError, AppResult, ValidationErrors};
use crate::middleware::Caller;
use crate::models::{wire_datetime, OfferType, Price};
use crate::pagination::PageParams;
use crate::permissions::{require_authenticated, require_business, require_offer_owner};
use crate::resources::ServerResources;
use crate::routes::links::Links;
use crate::routes::payload::{parse_body, FieldReader, Payload};
use crate::routes::{authorize, no_match, parse_id};

const OFFER_MODEL: &str = "Offer";
const DETAIL_MODEL: &str = "OfferDetail";

/// Package reference in list views
#[derive(Debug, Serialize)]
pub struct DetailLink {
    /// Package id
    pub id: i64,
    /// Absolute URL of the package
    pub url: String,
}

/// Full package representation
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    /// Package id
    pub id: i64,
    /// Package headline
    pub title: String,
    /// Included revisions
    pub revisions: i64,
    /// Delivery time
    pub delivery_time_in_days: i64,
    /// Price as a two-decimal string
    pub price: Price,
    /// Feature bullet points
    pub features: Vec<String>,
    /// Package tier
    pub offer_type: OfferType,
}

impl From<OfferDetail> for DetailResponse {
    fn from(detail: OfferDetail) -> Self {
        Self {
            id: detail.id,
            title: detail.title,
            revisions: detail.revisions,
            delivery_time_in_days: detail.delivery_time_in_days,
            price: detail.price,
            features: detail.features,
            offer_type: detail.offer_type,
        }
    }
}

/// Publisher name block
#[derive(Debug, Serialize)]
pub struct UserDetails {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account name
    pub username: String,
}

/// Offer representation, generic over how packages are rendered
#[derive(Debug, Serialize)]
pub struct OfferResponse<D> {
    /// Offer id
    pub id: i64,
    /// Publishing profile id
    pub user: i64,
    /// Headline
    pub title: String,
    /// Absolute image URL
    pub image: Option<String>,
    /// Long description
    pub description: String,
    /// Packages
    pub details: Vec<D>,
    /// Creation time
    #[serde(serialize_with = "wire_datetime")]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(serialize_with = "wire_datetime")]
    pub updated_at: DateTime<Utc>,
    /// Cheapest package price
    pub min_price: Option<f64>,
    /// Fastest package delivery time
    pub min_delivery_time: Option<i64>,
    /// Publisher names
    pub user_details: UserDetails,
}

impl<D> OfferResponse<D> {
    fn build(record: OfferRecord, links: &Links, detail: impl Fn(OfferDetail) -> D) -> Self {
        let min_price = record.min_price().map(Price::as_f64);
        let min_delivery_time = record.min_delivery_time();
        let OfferRecord {
            offer,
            details,
            owner,
        } = record;
        Self {
            id: offer.id,
            user: offer.user_profile_id,
            title: offer.title,
            image: links.media_opt(offer.image.as_deref()),
            description: offer.description,
            details: details.into_iter().map(detail).collect(),
            created_at: offer.created_at,
            updated_at: offer.updated_at,
            min_price,
            min_delivery_time,
            user_details: UserDetails {
                first_name: owner.first_name,
                last_name: owner.last_name,
                username: owner.username,
            },
        }
    }
}

impl OfferResponse<DetailLink> {
    /// List and retrieve view: packages as `{id, url}`
    #[must_use]
    pub fn linked(record: OfferRecord, links: &Links) -> Self {
        Self::build(record, links, |d| DetailLink {
            id: d.id,
            url: links.offer_detail(d.id),
        })
    }
}

impl OfferResponse<DetailResponse> {
    /// Write view: full packages without links
    #[must_use]
    pub fn expanded(record: OfferRecord, links: &Links) -> Self {
        Self::build(record, links, DetailResponse::from)
    }
}

/// Offer and package routes
pub struct OfferRoutes;

impl OfferRoutes {
    /// Create all offer routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/offers",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/offers/:id",
                get(Self::handle_get)
                    .patch(Self::handle_patch)
                    .put(Self::handle_put)
                    .delete(Self::handle_delete),
            )
            .route("/api/offerdetails/:id", get(Self::handle_get_detail))
            .with_state(resources)
    }

    /// Handle GET /api/offers/
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        uri: Uri,
        caller: Caller,
        RawQuery(raw_query): RawQuery,
    ) -> Result<Response, AppError> {
        caller.throttle(&resources)?;

        let params = query_params(raw_query.as_deref());
        let query = parse_offer_query(&params)?;
        let page_params = PageParams {
            page: params.get(pagination::PAGE_QUERY_PARAM).cloned(),
            page_size: params.get(pagination::PAGE_SIZE_QUERY_PARAM).cloned(),
        };

        let offers = resources.database.offers();
        let count = offers.count(&query).await?;
        let window = page_params.resolve(count)?;
        let records = offers.list(&query, window.offset(), window.limit()).await?;

        let links = Links::for_request(&resources.config, &headers);
        let request_url = links.request_url(&uri)?;
        let results: Vec<_> = records
            .into_iter()
            .map(|record| OfferResponse::linked(record, &links))
            .collect();
        Ok((StatusCode::OK, Json(window.into_page(results, &request_url))).into_response())
    }

    /// Handle POST /api/offers/
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        caller: Caller,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_business(caller.principal()),
            &caller,
            "offer",
            "create",
        )?;
        caller.throttle(&resources)?;

        let payload = parse_body(&body)?;
        let new_offer = read_new_offer(&payload)?;
        let profile_id = principal
            .profile_id()
            .ok_or_else(|| AppError::non_field(messages::PROFILE_DOES_NOT_EXIST))?;

        let offers = resources.database.offers();
        let offer_id = offers.create(profile_id, &new_offer).await?;
        info!(offer.id = offer_id, profile.id = profile_id, "Offer created");

        let record = offers
            .get(offer_id)
            .await?
            .ok_or_else(|| no_match(OFFER_MODEL))?;
        let links = Links::for_request(&resources.config, &headers);
        Ok((StatusCode::CREATED, Json(OfferResponse::expanded(record, &links))).into_response())
    }

    /// Handle GET /api/offers/{id}/
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        caller: Caller,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        authorize(
            require_authenticated(caller.principal()),
            &caller,
            "offer",
            "read",
        )?;
        caller.throttle(&resources)?;

        let offer_id = parse_id(&id, OFFER_MODEL)?;
        let record = resources
            .database
            .offers()
            .get(offer_id)
            .await?
            .ok_or_else(|| no_match(OFFER_MODEL))?;

        let links = Links::for_request(&resources.config, &headers);
        Ok((StatusCode::OK, Json(OfferResponse::linked(record, &links))).into_response())
    }

    /// Handle PATCH /api/offers/{id}/
    async fn handle_patch(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        caller: Caller,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        Self::update(&resources, &headers, &caller, &id, &body, true).await
    }

    /// Handle PUT /api/offers/{id}/
    async fn handle_put(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        caller: Caller,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        Self::update(&resources, &headers, &caller, &id, &body, false).await
    }

    async fn update(
        resources: &ServerResources,
        headers: &HeaderMap,
        caller: &Caller,
        id: &str,
        body: &[u8],
        partial: bool,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            caller,
            "offer",
            "update",
        )?;
        caller.throttle(resources)?;

        let offer_id = parse_id(id, OFFER_MODEL)?;
        let offers = resources.database.offers();
        let record = offers
            .get(offer_id)
            .await?
            .ok_or_else(|| no_match(OFFER_MODEL))?;
        authorize(
            require_offer_owner(principal, record.offer.user_profile_id),
            caller,
            "offer",
            "update",
        )?;

        let payload = parse_body(body)?;
        let changes = read_offer_changes(&payload, partial)?;
        offers.update(&record.offer, changes).await?;
        info!(offer.id = offer_id, partial, "Offer updated");

        let record = offers
            .get(offer_id)
            .await?
            .ok_or_else(|| no_match(OFFER_MODEL))?;
        let links = Links::for_request(&resources.config, headers);
        Ok((StatusCode::OK, Json(OfferResponse::expanded(record, &links))).into_response())
    }

    /// Handle DELETE /api/offers/{id}/
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            &caller,
            "offer",
            "delete",
        )?;
        caller.throttle(&resources)?;

        let offer_id = parse_id(&id, OFFER_MODEL)?;
        let offers = resources.database.offers();
        let record = offers
            .get(offer_id)
            .await?
            .ok_or_else(|| no_match(OFFER_MODEL))?;
        authorize(
            require_offer_owner(principal, record.offer.user_profile_id),
            &caller,
            "offer",
            "delete",
        )?;

        if !offers.delete(offer_id).await? {
            return Err(no_match(OFFER_MODEL));
        }
        info!(offer.id = offer_id, "Offer deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle GET /api/offerdetails/{id}/
    async fn handle_get_detail(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        authorize(
            require_authenticated(caller.principal()),
            &caller,
            "offer_detail",
            "read",
        )?;
        caller.throttle(&resources)?;

        let detail_id = parse_id(&id, DETAIL_MODEL)?;
        let detail = resources
            .database
            .offers()
            .get_detail(detail_id)
            .await?
            .ok_or_else(|| no_match(DETAIL_MODEL))?;
        Ok((StatusCode::OK, Json(DetailResponse::from(detail))).into_response())
    }
}

/// Decode a query string; later duplicates win
fn query_params(raw_query: Option<&str>) -> HashMap<String, String> {
    raw_query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Numeric filter value; blank values are ignored
fn number_param(
    params: &HashMap<String, String>,
    name: &str,
    errors: &mut ValidationErrors,
) -> Option<f64> {
    let raw = params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.add(name, messages::ENTER_A_NUMBER);
            None
        }
    }
}

/// Build list filters from query parameters
fn parse_offer_query(params: &HashMap<String, String>) -> AppResult<OfferQuery> {
    let mut errors = ValidationErrors::new();

    let creator_id = params
        .get("creator_id")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .and_then(|raw| match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("creator_id", messages::ENTER_A_NUMBER);
                None
            }
        });
    let max_delivery_time = number_param(params, "max_delivery_time", &mut errors);
    let min_price = number_param(params, "min_price", &mut errors);
    errors.into_result()?;

    let search_terms = params
        .get("search")
        .map(|s| {
            s.replace('\0', "")
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let ordering = params
        .get("ordering")
        .and_then(|raw| {
            raw.split(',').map(str::trim).find_map(|term| {
                let (descending, field) = term
                    .strip_prefix('-')
                    .map_or((false, term), |field| (true, field));
                OfferOrderField::parse(field).map(|field| (field, descending))
            })
        })
        .unwrap_or((OfferOrderField::UpdatedAt, false));

    Ok(OfferQuery {
        creator_id,
        max_delivery_time,
        min_price,
        search_terms,
        ordering,
    })
}

/// Validate one package object
fn read_detail(payload: &Payload, partial: bool) -> (DetailChange, ValidationErrors) {
    let mut reader = if partial {
        FieldReader::partial(payload)
    } else {
        FieldReader::new(payload)
    };
    let change = DetailChange {
        title: reader.required_string("title", Some(limits::TITLE_MAX_LENGTH)),
        revisions: reader.integer("revisions", true, None, None),
        delivery_time_in_days: reader.integer("delivery_time_in_days", true, Some(1), None),
        price: reader.price("price", true),
        features: reader.string_list("features", true),
        offer_type: reader.choice("offer_type", true, OfferType::parse),
    };
    (change, reader.into_errors())
}

/// Validate the `details` list; `None` when absent in partial mode
fn read_details(
    reader: &mut FieldReader<'_>,
    partial: bool,
) -> Option<Vec<DetailChange>> {
    let objects = reader.object_list("details", true)?;
    if objects.is_empty() && !partial {
        reader.error("details", "This list may not be empty.");
        return None;
    }
    let mut changes = Vec::with_capacity(objects.len());
    for (index, object) in objects.into_iter().enumerate() {
        let (change, errors) = read_detail(object, partial);
        if errors.is_empty() {
            changes.push(change);
        } else {
            reader.nested_errors(&format!("details[{index}]"), errors);
        }
    }
    Some(changes)
}

fn read_new_offer(payload: &Payload) -> AppResult<NewOffer> {
    let mut reader = FieldReader::new(payload);
    let title = reader.required_string("title", Some(limits::TITLE_MAX_LENGTH));
    let image = reader.nullable_string("image").flatten();
    let description = reader.optional_string("description", None).unwrap_or_default();
    let details = read_details(&mut reader, false);
    reader.finish()?;

    let (Some(title), Some(details)) = (title, details) else {
        return Err(AppError::internal("Offer fields missing after validation"));
    };
    let details = details
        .into_iter()
        .map(DetailChange::into_new)
        .collect::<Option<Vec<NewOfferDetail>>>()
        .ok_or_else(|| AppError::invalid_input(messages::CREATE_DETAIL_FAILED))?;

    Ok(NewOffer {
        title,
        image,
        description,
        details,
    })
}

fn read_offer_changes(payload: &Payload, partial: bool) -> AppResult<OfferChanges> {
    let mut reader = if partial {
        FieldReader::partial(payload)
    } else {
        FieldReader::new(payload)
    };
    let changes = OfferChanges {
        title: reader.required_string("title", Some(limits::TITLE_MAX_LENGTH)),
        image: reader.nullable_string("image"),
        description: if partial {
            reader.optional_string("description", None)
        } else {
            reader.required_string("description", None)
        },
        details: read_details(&mut reader, partial),
    };
    reader.finish()?;
    Ok(changes)
}
