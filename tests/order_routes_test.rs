// ABOUTME: Integration tests for placing and managing orders and the business order counters
// ABOUTME: Verifies party visibility, status transitions by the business owner, and staff-only deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;
mod helpers;

use axum::http::StatusCode;
use coderr::server::App;
use common::{
    create_offer, create_order, create_staff, create_test_app, detail_id, register_business,
    register_customer, TestAccount,
};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

struct Marketplace {
    business: TestAccount,
    customer: TestAccount,
    basic_id: i64,
}

async fn marketplace(app: &App) -> Marketplace {
    let business = register_business(app, "studio").await;
    let customer = register_customer(app, "buyer").await;
    let offer = create_offer(app, &business.token, "Logo").await;
    Marketplace {
        basic_id: detail_id(&offer, "basic"),
        business,
        customer,
    }
}

#[tokio::test]
async fn test_customer_places_order() {
    let (app, _) = create_test_app().await;
    let m = marketplace(&app).await;

    let order = create_order(&app, &m.customer.token, m.basic_id).await;

    assert_eq!(order["customer_user"], m.customer.profile_id);
    assert_eq!(order["business_user"], m.business.profile_id);
    assert_eq!(order["status"], "in_progress");
    assert_eq!(order["title"], "Basic Design");
    assert_eq!(order["price"], json!(100.0));
    assert_eq!(order["revisions"], 2);
    assert_eq!(order["delivery_time_in_days"], 5);
    assert_eq!(order["offer_type"], "basic");
}

#[tokio::test]
async fn test_create_rejects_bad_bodies() {
    let (app, resources) = create_test_app().await;
    let m = marketplace(&app).await;

    let body: Value = AxumTestRequest::post("/api/orders/")
        .token(&m.customer.token)
        .json(&json!({"offer_detail_id": m.basic_id, "zeta": 1, "alpha": 2}))
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(
        body,
        json!({"non_field_errors": "Unexpected fields: alpha, zeta"})
    );

    let body: Value = AxumTestRequest::post("/api/orders/")
        .token(&m.customer.token)
        .json(&json!({}))
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["offer_detail_id"], json!(["This field is required."]));

    let body: Value = AxumTestRequest::post("/api/orders/")
        .token(&m.customer.token)
        .json(&json!({"offer_detail_id": 9999}))
        .send(&app)
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .json();
    assert_eq!(body["detail"], "OfferDetail not found.");

    let staff = create_staff(&resources, "ops").await;
    let body: Value = AxumTestRequest::post("/api/orders/")
        .token(&staff)
        .json(&json!({"offer_detail_id": m.basic_id}))
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(
        body,
        json!({"non_field_errors": ["User Profile does not exist."]})
    );
}

#[tokio::test]
async fn test_lists_are_scoped_to_the_caller() {
    let (app, resources) = create_test_app().await;
    let m = marketplace(&app).await;
    let other = register_customer(&app, "other").await;
    create_order(&app, &m.customer.token, m.basic_id).await;

    let mine: Vec<Value> = AxumTestRequest::get("/api/orders/")
        .token(&m.customer.token)
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(mine.len(), 1);

    let incoming: Vec<Value> = AxumTestRequest::get("/api/orders/")
        .token(&m.business.token)
        .send(&app)
        .await
        .json();
    assert_eq!(incoming.len(), 1);

    let none: Vec<Value> = AxumTestRequest::get("/api/orders/")
        .token(&other.token)
        .send(&app)
        .await
        .json();
    assert!(none.is_empty());

    let staff = create_staff(&resources, "ops").await;
    let body: Value = AxumTestRequest::get("/api/orders/")
        .token(&staff)
        .send(&app)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .json();
    assert_eq!(body["detail"], "User profile not found.");
}

#[tokio::test]
async fn test_only_parties_read_an_order() {
    let (app, resources) = create_test_app().await;
    let m = marketplace(&app).await;
    let order = create_order(&app, &m.customer.token, m.basic_id).await;
    let uri = format!("/api/orders/{}/", order["id"]);
    let stranger = register_customer(&app, "stranger").await;
    let staff = create_staff(&resources, "ops").await;

    for token in [&m.customer.token, &m.business.token, &staff] {
        AxumTestRequest::get(&uri)
            .token(token)
            .send(&app)
            .await
            .assert_status(StatusCode::OK);
    }
    AxumTestRequest::get(&uri)
        .token(&stranger.token)
        .send(&app)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_business_owner_updates_status() {
    let (app, _) = create_test_app().await;
    let m = marketplace(&app).await;
    let order = create_order(&app, &m.customer.token, m.basic_id).await;
    let uri = format!("/api/orders/{}/", order["id"]);

    AxumTestRequest::patch(&uri)
        .token(&m.customer.token)
        .json(&json!({"status": "completed"}))
        .send(&app)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let body: Value = AxumTestRequest::patch(&uri)
        .token(&m.business.token)
        .json(&json!({"status": "completed", "price": 1}))
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["price"], json!(100.0));

    let body: Value = AxumTestRequest::patch(&uri)
        .token(&m.business.token)
        .json(&json!({"status": "done"}))
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["status"], json!(["\"done\" is not a valid choice."]));

    AxumTestRequest::patch(&uri)
        .token(&m.business.token)
        .json(&json!({"unknown": true}))
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_staff_delete_orders() {
    let (app, resources) = create_test_app().await;
    let m = marketplace(&app).await;
    let order = create_order(&app, &m.customer.token, m.basic_id).await;
    let uri = format!("/api/orders/{}/", order["id"]);

    for token in [&m.customer.token, &m.business.token] {
        AxumTestRequest::delete(&uri)
            .token(token)
            .send(&app)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    let staff = create_staff(&resources, "ops").await;
    let response = AxumTestRequest::delete(&uri)
        .token(&staff)
        .send(&app)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(response.is_empty());

    AxumTestRequest::get(&uri)
        .token(&staff)
        .send(&app)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_missing_order_is_not_found_for_everyone() {
    let (app, resources) = create_test_app().await;
    let m = marketplace(&app).await;
    let staff = create_staff(&resources, "ops").await;

    for token in [&m.customer.token, &m.business.token, &staff] {
        let body: Value = AxumTestRequest::delete("/api/orders/9999/")
            .token(token)
            .send(&app)
            .await
            .assert_status(StatusCode::NOT_FOUND)
            .json();
        assert_eq!(body["detail"], "No Order matches the given query.");
    }

    AxumTestRequest::delete("/api/orders/9999/")
        .send(&app)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_order_counters() {
    let (app, _) = create_test_app().await;
    let m = marketplace(&app).await;
    let first = create_order(&app, &m.customer.token, m.basic_id).await;
    create_order(&app, &m.customer.token, m.basic_id).await;

    AxumTestRequest::patch(&format!("/api/orders/{}/", first["id"]))
        .token(&m.business.token)
        .json(&json!({"status": "completed"}))
        .send(&app)
        .await
        .assert_status(StatusCode::OK);

    let in_progress: Value =
        AxumTestRequest::get(&format!("/api/order-count/{}/", m.business.profile_id))
            .token(&m.customer.token)
            .send(&app)
            .await
            .assert_status(StatusCode::OK)
            .json();
    assert_eq!(in_progress, json!({"order_count": 1}));

    let completed: Value = AxumTestRequest::get(&format!(
        "/api/completed-order-count/{}/",
        m.business.profile_id
    ))
    .token(&m.customer.token)
    .send(&app)
    .await
    .assert_status(StatusCode::OK)
    .json();
    assert_eq!(completed, json!({"completed_order_count": 1}));

    let body: Value =
        AxumTestRequest::get(&format!("/api/order-count/{}/", m.customer.profile_id))
            .token(&m.customer.token)
            .send(&app)
            .await
            .assert_status(StatusCode::NOT_FOUND)
            .json();
    assert_eq!(body["detail"], "This id does not exist");
}
