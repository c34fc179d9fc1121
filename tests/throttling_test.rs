// ABOUTME: Integration tests for scoped request throttling
// ABOUTME: Exhausts login, registration, order, and default scopes and inspects the 429 responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;
mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use coderr::config::ServerConfig;
use coderr::rate_limiting::{ThrottleConfig, ThrottleRate};
use common::{create_test_app_with, register_customer, PASSWORD};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

fn throttled_config(configure: impl FnOnce(&mut ThrottleConfig)) -> ServerConfig {
    let mut config = ServerConfig::for_testing();
    config.throttle = ThrottleConfig::default();
    configure(&mut config.throttle);
    config
}

const fn per_minute(requests: u32) -> ThrottleRate {
    ThrottleRate::new(requests, Duration::from_secs(60))
}

#[tokio::test]
async fn test_login_scope_limits_attempts() {
    let (app, _) = create_test_app_with(throttled_config(|t| t.login = per_minute(2))).await;
    register_customer(&app, "alice").await;

    for _ in 0..2 {
        AxumTestRequest::post("/api/login/")
            .json(&json!({"username": "alice", "password": "wrong"}))
            .send(&app)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    let response = AxumTestRequest::post("/api/login/")
        .json(&json!({"username": "alice", "password": PASSWORD}))
        .send(&app)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("x-ratelimit-limit"), Some("2"));
    assert_eq!(response.header("x-ratelimit-remaining"), Some("0"));
    let retry_after: u64 = response.header("retry-after").unwrap().parse().unwrap();
    assert!(retry_after <= 60);
    let body: Value = response.json();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Request was throttled. Expected available in"));
}

#[tokio::test]
async fn test_registration_scope_is_separate_from_anon() {
    let (app, _) = create_test_app_with(throttled_config(|t| {
        t.registration = per_minute(1);
        t.anon = per_minute(100);
    }))
    .await;

    register_customer(&app, "alice").await;
    AxumTestRequest::post("/api/registration/")
        .json(&json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": PASSWORD,
            "repeated_password": PASSWORD,
            "type": "customer"
        }))
        .send(&app)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    AxumTestRequest::get("/api/offers/")
        .send(&app)
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_default_scope() {
    let (app, _) = create_test_app_with(throttled_config(|t| t.anon = per_minute(3))).await;

    for _ in 0..3 {
        AxumTestRequest::get("/api/reviews/")
            .send(&app)
            .await
            .assert_status(StatusCode::OK);
    }
    AxumTestRequest::get("/api/base-info/")
        .send(&app)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    // A different client address gets its own window
    AxumTestRequest::get("/api/base-info/")
        .header("x-forwarded-for", "203.0.113.9")
        .send(&app)
        .await
        .assert_status(StatusCode::OK);

    // Health checks are never throttled
    AxumTestRequest::get("/health")
        .send(&app)
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_permission_failure_precedes_throttle() {
    let (app, _) = create_test_app_with(throttled_config(|t| t.anon = per_minute(1))).await;

    for _ in 0..3 {
        AxumTestRequest::get("/api/orders/")
            .send(&app)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_disabled_throttling() {
    let mut config = ServerConfig::for_testing();
    config.throttle = ThrottleConfig::disabled();
    config.throttle.anon = per_minute(1);
    let (app, _) = create_test_app_with(config).await;

    for _ in 0..5 {
        AxumTestRequest::get("/api/base-info/")
            .send(&app)
            .await
            .assert_status(StatusCode::OK);
    }
}
