// ABOUTME: Order route handlers for placing, listing, progressing, and removing package orders
// ABOUTME: Also serves the per-business in-progress and completed order counters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::constants::messages;
use crate::database::OrderRecord;
use crate::errors::AppError;
use crate::middleware::Caller;
use crate::models::{wire_datetime, OfferType, OrderStatus, ProfileType};
use crate::permissions::{
    require_authenticated, require_order_read, require_order_write, require_staff,
};
use crate::rate_limiting::ThrottleScope;
use crate::resources::ServerResources;
use crate::routes::payload::{parse_body, reject_unknown_fields, FieldReader};
use crate::routes::{authorize, no_match, parse_id};

const MODEL: &str = "Order";

/// Keys an order body may carry; everything except `status` and
/// `offer_detail_id` is read-only
const ORDER_FIELDS: &[&str] = &[
    "id",
    "title",
    "customer_user",
    "business_user",
    "status",
    "created_at",
    "updated_at",
    "offer_detail_id",
    "revisions",
    "price",
    "delivery_time_in_days",
    "features",
    "offer_type",
];

/// Order with the ordered package's terms flattened in
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order id
    pub id: i64,
    /// Package headline
    pub title: String,
    /// Ordering profile id
    pub customer_user: i64,
    /// Offering profile id
    pub business_user: i64,
    /// Progress state
    pub status: OrderStatus,
    /// Placement time
    #[serde(serialize_with = "wire_datetime")]
    pub created_at: DateTime<Utc>,
    /// Last status change
    #[serde(serialize_with = "wire_datetime")]
    pub updated_at: DateTime<Utc>,
    /// Included revisions
    pub revisions: i64,
    /// Package price as a number
    pub price: f64,
    /// Delivery time
    pub delivery_time_in_days: i64,
    /// Feature bullet points
    pub features: Vec<String>,
    /// Package tier
    pub offer_type: OfferType,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            id: order.id,
            title: order.detail.title,
            customer_user: order.customer_profile_id,
            business_user: order.business_profile_id,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
            revisions: order.detail.revisions,
            price: order.detail.price.as_f64(),
            delivery_time_in_days: order.detail.delivery_time_in_days,
            features: order.detail.features,
            offer_type: order.detail.offer_type,
        }
    }
}

/// Order routes
pub struct OrderRoutes;

impl OrderRoutes {
    /// Create all order routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/orders",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/orders/:id",
                get(Self::handle_get)
                    .patch(Self::handle_update)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .route(
                "/api/order-count/:business_user_id",
                get(Self::handle_order_count),
            )
            .route(
                "/api/completed-order-count/:business_user_id",
                get(Self::handle_completed_order_count),
            )
            .with_state(resources)
    }

    /// Handle GET /api/orders/
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            &caller,
            "order",
            "list",
        )?;
        caller.throttle(&resources)?;

        let profile = principal
            .profile
            .ok_or_else(|| AppError::permission_denied(messages::PROFILE_NOT_FOUND))?;
        let orders = resources.database.orders();
        let records = match profile.profile_type {
            ProfileType::Customer => orders.list_for_customer(profile.id).await?,
            ProfileType::Business => orders.list_for_business(profile.id).await?,
        };

        let body: Vec<OrderResponse> = records.into_iter().map(OrderResponse::from).collect();
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle POST /api/orders/
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            &caller,
            "order",
            "create",
        )?;
        resources.throttler.enforce_scope(
            ThrottleScope::OrderCreate,
            caller.principal(),
            &caller.client_ip,
        )?;

        let payload = parse_body(&body)?;
        reject_unknown_fields(&payload, ORDER_FIELDS)?;
        let mut reader = FieldReader::new(&payload);
        let detail_id = reader.integer("offer_detail_id", true, None, None);
        reader.finish()?;
        let Some(detail_id) = detail_id else {
            return Err(AppError::internal("Order fields missing after validation"));
        };

        let customer_profile_id = principal
            .profile_id()
            .ok_or_else(|| AppError::non_field(messages::PROFILE_DOES_NOT_EXIST))?;
        let order = resources
            .database
            .orders()
            .create(customer_profile_id, detail_id)
            .await?
            .ok_or_else(|| AppError::not_found_detail(messages::OFFER_DETAIL_NOT_FOUND))?;
        info!(
            order.id = order.id,
            offer_detail.id = detail_id,
            profile.id = customer_profile_id,
            "Order placed"
        );

        Ok((StatusCode::CREATED, Json(OrderResponse::from(order))).into_response())
    }

    /// Handle GET /api/orders/{id}/
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            &caller,
            "order",
            "read",
        )?;
        caller.throttle(&resources)?;

        let order_id = parse_id(&id, MODEL)?;
        let order = resources
            .database
            .orders()
            .get(order_id)
            .await?
            .ok_or_else(|| no_match(MODEL))?;
        authorize(
            require_order_read(principal, order.parties()),
            &caller,
            "order",
            "read",
        )?;

        Ok((StatusCode::OK, Json(OrderResponse::from(order))).into_response())
    }

    /// Handle PATCH and PUT /api/orders/{id}/; only the status is writable
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            &caller,
            "order",
            "update",
        )?;
        caller.throttle(&resources)?;

        let order_id = parse_id(&id, MODEL)?;
        let orders = resources.database.orders();
        let order = orders.get(order_id).await?.ok_or_else(|| no_match(MODEL))?;
        authorize(
            require_order_write(principal, order.parties()),
            &caller,
            "order",
            "update",
        )?;

        let payload = parse_body(&body)?;
        reject_unknown_fields(&payload, ORDER_FIELDS)?;
        let mut reader = FieldReader::partial(&payload);
        let status = reader.choice("status", false, OrderStatus::parse);
        reader.finish()?;

        let status = status.unwrap_or(order.status);
        let order = orders
            .update_status(order_id, status)
            .await?
            .ok_or_else(|| no_match(MODEL))?;
        info!(order.id = order_id, order.status = %status, "Order status updated");

        Ok((StatusCode::OK, Json(OrderResponse::from(order))).into_response())
    }

    /// Handle DELETE /api/orders/{id}/
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            &caller,
            "order",
            "delete",
        )?;
        caller.throttle(&resources)?;

        let order_id = parse_id(&id, MODEL)?;
        let orders = resources.database.orders();
        if orders.get(order_id).await?.is_none() {
            return Err(no_match(MODEL));
        }
        authorize(require_staff(principal), &caller, "order", "delete")?;

        if !orders.delete(order_id).await? {
            return Err(no_match(MODEL));
        }
        info!(order.id = order_id, "Order deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle GET /api/order-count/{business_user_id}/
    async fn handle_order_count(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(business_user_id): Path<String>,
    ) -> Result<Response, AppError> {
        let count = Self::count(&resources, &caller, &business_user_id, OrderStatus::InProgress)
            .await?;
        Ok((StatusCode::OK, Json(json!({ "order_count": count }))).into_response())
    }

    /// Handle GET /api/completed-order-count/{business_user_id}/
    async fn handle_completed_order_count(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(business_user_id): Path<String>,
    ) -> Result<Response, AppError> {
        let count = Self::count(&resources, &caller, &business_user_id, OrderStatus::Completed)
            .await?;
        Ok((StatusCode::OK, Json(json!({ "completed_order_count": count }))).into_response())
    }

    async fn count(
        resources: &ServerResources,
        caller: &Caller,
        raw_id: &str,
        status: OrderStatus,
    ) -> Result<i64, AppError> {
        authorize(
            require_authenticated(caller.principal()),
            caller,
            "order_count",
            "read",
        )?;
        caller.throttle(resources)?;

        let unknown = || AppError::not_found_detail(messages::ID_DOES_NOT_EXIST);
        let profile_id: i64 = raw_id.parse().map_err(|_| unknown())?;
        match resources.database.users().profile_type(profile_id).await? {
            Some(ProfileType::Business) => {}
            _ => return Err(unknown()),
        }
        resources
            .database
            .orders()
            .count_for_business(profile_id, status)
            .await
    }
}
