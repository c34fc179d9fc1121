// ABOUTME: Integration tests for profile retrieval, editing, and type-filtered listings
// ABOUTME: Verifies ownership checks, read-only fields, and media URL rendering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{create_test_app, register_business, register_customer};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

#[tokio::test]
async fn test_profile_view_shape() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;

    let body: Value = AxumTestRequest::get(&format!("/api/profile/{}/", biz.profile_id))
        .token(&biz.token)
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(body["user"], biz.profile_id);
    assert_eq!(body["username"], "studio");
    assert_eq!(body["type"], "business");
    assert_eq!(body["email"], "studio@example.com");
    assert_eq!(body["file"], Value::Null);
    assert_eq!(body["location"], "");
    assert!(body["created_at"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_owner_updates_profile_and_account_fields() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    let uri = format!("/api/profile/{}/", biz.profile_id);

    let body: Value = AxumTestRequest::patch(&uri)
        .token(&biz.token)
        .json(&json!({
            "first_name": "Max",
            "last_name": "Mustermann",
            "location": "Berlin",
            "tel": "0123456789",
            "file": "profiles/max.png",
            "email": "max@example.com",
            "user": 999,
            "created_at": "2000-01-01T00:00:00Z"
        }))
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(body["first_name"], "Max");
    assert_eq!(body["location"], "Berlin");
    assert_eq!(body["email"], "max@example.com");
    assert_eq!(body["user"], biz.profile_id);
    assert_eq!(body["file"], "http://testserver/media/profiles/max.png");
}

#[tokio::test]
async fn test_profile_update_validation() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;

    let body: Value = AxumTestRequest::patch(&format!("/api/profile/{}/", biz.profile_id))
        .token(&biz.token)
        .json(&json!({"email": "nope", "type": "wizard"}))
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["email"], json!(["Enter a valid email address."]));
    assert_eq!(body["type"], json!(["\"wizard\" is not a valid choice."]));
}

#[tokio::test]
async fn test_only_owner_may_edit_profile() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    let customer = register_customer(&app, "buyer").await;
    let uri = format!("/api/profile/{}/", biz.profile_id);

    AxumTestRequest::patch(&uri)
        .token(&customer.token)
        .json(&json!({"location": "Hamburg"}))
        .send(&app)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::patch(&uri)
        .json(&json!({"location": "Hamburg"}))
        .send(&app)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_profile_is_404() {
    let (app, _) = create_test_app().await;
    let customer = register_customer(&app, "buyer").await;

    let body: Value = AxumTestRequest::get("/api/profile/9999/")
        .token(&customer.token)
        .send(&app)
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .json();
    assert_eq!(body["detail"], "No UserProfile matches the given query.");
}

#[tokio::test]
async fn test_profile_lists_filter_by_type() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    register_business(&app, "agency").await;
    let customer = register_customer(&app, "buyer").await;

    let businesses: Vec<Value> = AxumTestRequest::get("/api/profiles/business/")
        .token(&customer.token)
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(businesses.len(), 2);
    assert!(businesses.iter().all(|p| p["type"] == "business"));

    let customers: Vec<Value> = AxumTestRequest::get("/api/profiles/customer")
        .token(&biz.token)
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["username"], "buyer");
}
