// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Builds in-memory applications and seeds accounts, offers, and orders through the API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `coderr`
//!
//! Test files declare both `mod common;` and `mod helpers;`.

use std::sync::{Arc, Once};

use axum::http::StatusCode;
use coderr::config::ServerConfig;
use coderr::database::{Database, NewUser};
use coderr::models::ProfileType;
use coderr::resources::ServerResources;
use coderr::server::{build_app, App};
use serde_json::{json, Value};

use crate::helpers::axum_test::AxumTestRequest;

static INIT_LOGGER: Once = Once::new();

/// Password used for every seeded account
pub const PASSWORD: &str = "Secret123!";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Resources over a fresh in-memory database
pub async fn create_test_resources(config: ServerConfig) -> Arc<ServerResources> {
    init_test_logging();
    let database = Database::new(&config.database)
        .await
        .expect("Failed to create test database");
    Arc::new(ServerResources::new(config, database))
}

/// Application with the default test configuration
pub async fn create_test_app() -> (App, Arc<ServerResources>) {
    create_test_app_with(ServerConfig::for_testing()).await
}

/// Application with a custom configuration
pub async fn create_test_app_with(config: ServerConfig) -> (App, Arc<ServerResources>) {
    let resources = create_test_resources(config).await;
    (build_app(Arc::clone(&resources)), resources)
}

/// Account created through the registration endpoint
#[derive(Debug, Clone)]
pub struct TestAccount {
    /// Raw token
    pub token: String,
    /// Profile id (`user_id` on the wire)
    pub profile_id: i64,
    /// Login name
    pub username: String,
}

/// Register an account of `profile_type` through the API
pub async fn register(app: &App, username: &str, profile_type: &str) -> TestAccount {
    let body: Value = AxumTestRequest::post("/api/registration/")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
            "repeated_password": PASSWORD,
            "type": profile_type,
        }))
        .send(app)
        .await
        .assert_status(StatusCode::CREATED)
        .json();

    TestAccount {
        token: body["token"].as_str().expect("token").to_owned(),
        profile_id: body["user_id"].as_i64().expect("user_id"),
        username: username.to_owned(),
    }
}

/// Business account shortcut
pub async fn register_business(app: &App, username: &str) -> TestAccount {
    register(app, username, "business").await
}

/// Customer account shortcut
pub async fn register_customer(app: &App, username: &str) -> TestAccount {
    register(app, username, "customer").await
}

/// Staff account without a profile, seeded straight into the database
pub async fn create_staff(resources: &ServerResources, username: &str) -> String {
    create_staff_with_profile(resources, username, None).await
}

/// Staff account with an optional profile
pub async fn create_staff_with_profile(
    resources: &ServerResources,
    username: &str,
    profile_type: Option<ProfileType>,
) -> String {
    let password_hash = resources
        .auth
        .hash_password(PASSWORD)
        .await
        .expect("hash password");
    let (token, digest) = resources.auth.issue_token();
    let new_user = NewUser {
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        password_hash,
        is_staff: true,
        is_superuser: false,
    };
    resources
        .database
        .users()
        .create(&new_user, profile_type, Some(&digest))
        .await
        .expect("create staff user");
    token
}

/// A complete three-tier offer body
pub fn offer_payload(title: &str) -> Value {
    json!({
        "title": title,
        "image": null,
        "description": format!("{title} description"),
        "details": [
            {
                "title": "Basic Design",
                "revisions": 2,
                "delivery_time_in_days": 5,
                "price": 100,
                "features": ["Logo Design", "Visitenkarte"],
                "offer_type": "basic"
            },
            {
                "title": "Standard Design",
                "revisions": 5,
                "delivery_time_in_days": 7,
                "price": 200,
                "features": ["Logo Design", "Visitenkarte", "Briefpapier"],
                "offer_type": "standard"
            },
            {
                "title": "Premium Design",
                "revisions": 10,
                "delivery_time_in_days": 10,
                "price": 500,
                "features": ["Logo Design", "Visitenkarte", "Briefpapier", "Flyer"],
                "offer_type": "premium"
            }
        ]
    })
}

/// Publish an offer and return the write view
pub async fn create_offer(app: &App, token: &str, title: &str) -> Value {
    AxumTestRequest::post("/api/offers/")
        .token(token)
        .json(&offer_payload(title))
        .send(app)
        .await
        .assert_status(StatusCode::CREATED)
        .json()
}

/// Id of the package with `offer_type` in an offer write view
pub fn detail_id(offer: &Value, offer_type: &str) -> i64 {
    offer["details"]
        .as_array()
        .expect("details")
        .iter()
        .find(|d| d["offer_type"] == offer_type)
        .and_then(|d| d["id"].as_i64())
        .expect("detail of requested type")
}

/// Place an order for a package and return the order view
pub async fn create_order(app: &App, token: &str, offer_detail_id: i64) -> Value {
    AxumTestRequest::post("/api/orders/")
        .token(token)
        .json(&json!({ "offer_detail_id": offer_detail_id }))
        .send(app)
        .await
        .assert_status(StatusCode::CREATED)
        .json()
}
