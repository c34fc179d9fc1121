// ABOUTME: Integration tests for the request middleware stack
// ABOUTME: Covers host validation, CORS headers, trailing-slash normalization, and request ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;
mod helpers;

use axum::http::{Method, StatusCode};
use coderr::config::ServerConfig;
use common::{create_test_app, create_test_app_with};
use helpers::axum_test::AxumTestRequest;
use serde_json::Value;

#[tokio::test]
async fn test_disallowed_host_is_rejected() {
    let (app, _) = create_test_app().await;

    let body: Value = AxumTestRequest::get("/api/base-info/")
        .header("host", "evil.example")
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["detail"], "Invalid HTTP_HOST header.");

    AxumTestRequest::get("/api/base-info/")
        .header("host", "localhost:8000")
        .send(&app)
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_subdomain_patterns() {
    let mut config = ServerConfig::for_testing();
    config.security.allowed_hosts = vec![".coderr.dev".to_owned()];
    let (app, _) = create_test_app_with(config).await;

    for host in ["coderr.dev", "api.coderr.dev"] {
        AxumTestRequest::get("/api/base-info/")
            .header("host", host)
            .send(&app)
            .await
            .assert_status(StatusCode::OK);
    }
    AxumTestRequest::get("/api/base-info/")
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cors_preflight_for_frontend_origin() {
    let mut config = ServerConfig::for_testing();
    config.security.cors_allowed_origins = vec!["http://127.0.0.1:5500".to_owned()];
    let (app, _) = create_test_app_with(config).await;

    let response = AxumTestRequest::method(Method::OPTIONS, "/api/offers/")
        .header("origin", "http://127.0.0.1:5500")
        .header("access-control-request-method", "PATCH")
        .header("access-control-request-headers", "authorization,content-type")
        .send(&app)
        .await;
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("http://127.0.0.1:5500")
    );
    assert_eq!(
        response.header("access-control-allow-credentials"),
        Some("true")
    );
    assert!(response
        .header("access-control-allow-methods")
        .unwrap()
        .contains("PATCH"));

    let response = AxumTestRequest::get("/api/offers/")
        .header("origin", "http://elsewhere.example")
        .send(&app)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(response.header("access-control-allow-origin"), None);
}

#[tokio::test]
async fn test_trailing_slash_is_optional() {
    let (app, _) = create_test_app().await;
    for uri in ["/api/offers", "/api/offers/", "/api/base-info/", "/health/"] {
        AxumTestRequest::get(uri)
            .send(&app)
            .await
            .assert_status(StatusCode::OK);
    }
}

#[tokio::test]
async fn test_request_id_is_generated_and_echoed() {
    let (app, _) = create_test_app().await;

    let response = AxumTestRequest::get("/health").send(&app).await;
    let generated = response.header("x-request-id").unwrap();
    assert_eq!(generated.len(), 36);

    let response = AxumTestRequest::get("/health")
        .header("x-request-id", "trace-me-123")
        .send(&app)
        .await;
    assert_eq!(response.header("x-request-id"), Some("trace-me-123"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _) = create_test_app().await;
    AxumTestRequest::get("/api/unknown/")
        .send(&app)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_id_is_404() {
    let (app, _) = create_test_app().await;
    AxumTestRequest::get("/api/reviews/abc/")
        .send(&app)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let (app, _) = create_test_app().await;

    for response in [
        AxumTestRequest::get("/api/base-info/").send(&app).await,
        AxumTestRequest::get("/api/base-info/")
            .header("host", "evil.example")
            .send(&app)
            .await,
    ] {
        assert_eq!(response.header("x-frame-options"), Some("DENY"));
        assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(response.header("referrer-policy"), Some("same-origin"));
    }
}
