// ABOUTME: Integration tests for offer publishing, browsing, editing, and package lookups
// ABOUTME: Covers list pagination and filters, nested package validation, and owner-only writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{
    create_offer, create_order, create_test_app, detail_id, offer_payload, register_business,
    register_customer,
};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_returns_full_details() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;

    let offer = create_offer(&app, &biz.token, "Logo").await;

    assert_eq!(offer["user"], biz.profile_id);
    assert_eq!(offer["title"], "Logo");
    assert_eq!(offer["min_price"], json!(100.0));
    assert_eq!(offer["min_delivery_time"], 5);
    assert_eq!(offer["user_details"]["username"], "studio");
    let details = offer["details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
    let basic = &details[0];
    assert_eq!(basic["price"], "100.00");
    assert_eq!(basic["offer_type"], "basic");
    assert_eq!(basic["features"], json!(["Logo Design", "Visitenkarte"]));
    assert!(basic.get("url").is_none());
}

#[tokio::test]
async fn test_list_is_public_and_links_details() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    let offer = create_offer(&app, &biz.token, "Logo").await;

    let page: Value = AxumTestRequest::get("/api/offers/")
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(page["count"], 1);
    assert_eq!(page["next"], Value::Null);
    assert_eq!(page["previous"], Value::Null);
    let item = &page["results"][0];
    assert_eq!(item["id"], offer["id"]);
    let basic_id = detail_id(&offer, "basic");
    let first = &item["details"][0];
    assert_eq!(first.as_object().unwrap().len(), 2);
    assert_eq!(first["id"], basic_id);
    assert_eq!(
        first["url"],
        format!("http://testserver/api/offerdetails/{basic_id}/")
    );
}

#[tokio::test]
async fn test_list_pagination_links() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    for i in 0..8 {
        create_offer(&app, &biz.token, &format!("Offer {i}")).await;
    }

    let page: Value = AxumTestRequest::get("/api/offers/?page_size=3&search=offer")
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(page["count"], 8);
    assert_eq!(page["results"].as_array().unwrap().len(), 3);
    assert_eq!(page["previous"], Value::Null);
    let next = page["next"].as_str().unwrap();
    assert!(next.starts_with("http://testserver/api/offers/?"));
    assert!(next.contains("page=2"));
    assert!(next.contains("page_size=3"));

    let last: Value = AxumTestRequest::get("/api/offers/?page_size=3&page=3")
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(last["results"].as_array().unwrap().len(), 2);
    assert_eq!(last["next"], Value::Null);

    let body: Value = AxumTestRequest::get("/api/offers/?page=9")
        .send(&app)
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .json();
    assert_eq!(body["detail"], "Invalid page.");
}

#[tokio::test]
async fn test_list_filters_and_ordering() {
    let (app, _) = create_test_app().await;
    let studio = register_business(&app, "studio").await;
    let agency = register_business(&app, "agency").await;

    create_offer(&app, &studio.token, "Logo").await;
    let mut cheap = offer_payload("Website");
    cheap["details"] = json!([{
        "title": "Quick", "revisions": 1, "delivery_time_in_days": 2,
        "price": "50.00", "features": [], "offer_type": "basic"
    }]);
    AxumTestRequest::post("/api/offers/")
        .token(&agency.token)
        .json(&cheap)
        .send(&app)
        .await
        .assert_status(StatusCode::CREATED);

    let by_creator: Value = AxumTestRequest::get(&format!(
        "/api/offers/?creator_id={}",
        agency.profile_id
    ))
    .send(&app)
    .await
    .json();
    assert_eq!(by_creator["count"], 1);
    assert_eq!(by_creator["results"][0]["title"], "Website");

    let fast: Value = AxumTestRequest::get("/api/offers/?max_delivery_time=3")
        .send(&app)
        .await
        .json();
    assert_eq!(fast["count"], 1);

    let pricey: Value = AxumTestRequest::get("/api/offers/?min_price=80")
        .send(&app)
        .await
        .json();
    assert_eq!(pricey["count"], 1);
    assert_eq!(pricey["results"][0]["title"], "Logo");

    let search: Value = AxumTestRequest::get("/api/offers/?search=website%20description")
        .send(&app)
        .await
        .json();
    assert_eq!(search["count"], 1);

    let ordered: Value = AxumTestRequest::get("/api/offers/?ordering=-min_price")
        .send(&app)
        .await
        .json();
    assert_eq!(ordered["results"][0]["title"], "Logo");
    assert_eq!(ordered["results"][1]["title"], "Website");

    let body: Value = AxumTestRequest::get("/api/offers/?min_price=cheap")
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body, json!({"min_price": ["Enter a number."]}));
}

#[tokio::test]
async fn test_only_businesses_create_offers() {
    let (app, _) = create_test_app().await;
    let customer = register_customer(&app, "buyer").await;

    AxumTestRequest::post("/api/offers/")
        .token(&customer.token)
        .json(&offer_payload("Logo"))
        .send(&app)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::post("/api/offers/")
        .json(&offer_payload("Logo"))
        .send(&app)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_validates_packages() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;

    let mut payload = offer_payload("Logo");
    payload["details"][1]["delivery_time_in_days"] = json!(0);
    payload["details"][2]["price"] = json!("12.345");
    let body: Value = AxumTestRequest::post("/api/offers/")
        .token(&biz.token)
        .json(&payload)
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(
        body["details[1].delivery_time_in_days"],
        json!(["Ensure this value is greater than or equal to 1."])
    );
    assert_eq!(
        body["details[2].price"],
        json!(["Ensure that there are no more than 2 decimal places."])
    );

    let mut duplicate = offer_payload("Logo");
    duplicate["details"][1]["offer_type"] = json!("basic");
    let body: Value = AxumTestRequest::post("/api/offers/")
        .token(&biz.token)
        .json(&duplicate)
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["detail"], "Create Detail failed.");

    // Nothing was stored by the failed attempts
    let page: Value = AxumTestRequest::get("/api/offers/").send(&app).await.json();
    assert_eq!(page["count"], 0);
}

#[tokio::test]
async fn test_package_without_features_is_a_field_error() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;

    let payload = json!({
        "title": "Logo",
        "description": "Logo description",
        "details": [{
            "title": "Basic Design",
            "revisions": 2,
            "delivery_time_in_days": 3,
            "price": 100,
            "offer_type": "basic"
        }]
    });
    let body: Value = AxumTestRequest::post("/api/offers/")
        .token(&biz.token)
        .json(&payload)
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["details[0].features"], json!(["This field is required."]));
    assert!(body.get("detail").is_none());

    // PUT packages are complete too
    let offer = create_offer(&app, &biz.token, "Logo").await;
    let mut put = payload;
    put["details"][0]["offer_type"] = json!("premium");
    let body: Value = AxumTestRequest::put(&format!("/api/offers/{}/", offer["id"]))
        .token(&biz.token)
        .json(&put)
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["details[0].features"], json!(["This field is required."]));
}

#[tokio::test]
async fn test_retrieve_requires_authentication() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    let offer = create_offer(&app, &biz.token, "Logo").await;
    let uri = format!("/api/offers/{}/", offer["id"]);

    AxumTestRequest::get(&uri)
        .send(&app)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let customer = register_customer(&app, "buyer").await;
    let body: Value = AxumTestRequest::get(&uri)
        .token(&customer.token)
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(body["details"][0]["url"].is_string());

    let body: Value = AxumTestRequest::get("/api/offers/4242/")
        .token(&customer.token)
        .send(&app)
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .json();
    assert_eq!(body["detail"], "No Offer matches the given query.");
}

#[tokio::test]
async fn test_patch_updates_matching_package() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    let offer = create_offer(&app, &biz.token, "Logo").await;
    let uri = format!("/api/offers/{}/", offer["id"]);

    let body: Value = AxumTestRequest::patch(&uri)
        .token(&biz.token)
        .json(&json!({
            "title": "Logo Deluxe",
            "details": [{"offer_type": "basic", "price": 120, "revisions": 3}]
        }))
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(body["title"], "Logo Deluxe");
    assert_eq!(body["description"], "Logo description");
    let basic = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["offer_type"] == "basic")
        .unwrap();
    assert_eq!(basic["price"], "120.00");
    assert_eq!(basic["revisions"], 3);
    assert_eq!(basic["title"], "Basic Design");
    assert_eq!(basic["id"], detail_id(&offer, "basic"));
    assert_eq!(body["min_price"], json!(120.0));
}

#[tokio::test]
async fn test_put_requires_complete_body() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    let offer = create_offer(&app, &biz.token, "Logo").await;

    let body: Value = AxumTestRequest::put(&format!("/api/offers/{}/", offer["id"]))
        .token(&biz.token)
        .json(&json!({"title": "Only a title"}))
        .send(&app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["description"], json!(["This field is required."]));
    assert_eq!(body["details"], json!(["This field is required."]));
}

#[tokio::test]
async fn test_non_owner_cannot_modify_offer() {
    let (app, _) = create_test_app().await;
    let owner = register_business(&app, "studio").await;
    let other = register_business(&app, "agency").await;
    let offer = create_offer(&app, &owner.token, "Logo").await;
    let uri = format!("/api/offers/{}/", offer["id"]);

    AxumTestRequest::patch(&uri)
        .token(&other.token)
        .json(&json!({"title": "Mine now"}))
        .send(&app)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    AxumTestRequest::delete(&uri)
        .token(&other.token)
        .send(&app)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_cascades_packages_and_orders() {
    let (app, resources) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    let customer = register_customer(&app, "buyer").await;
    let offer = create_offer(&app, &biz.token, "Logo").await;
    let basic_id = detail_id(&offer, "basic");
    let order = create_order(&app, &customer.token, basic_id).await;

    AxumTestRequest::delete(&format!("/api/offers/{}/", offer["id"]))
        .token(&biz.token)
        .send(&app)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    AxumTestRequest::get(&format!("/api/offerdetails/{basic_id}/"))
        .token(&customer.token)
        .send(&app)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    let order_id = order["id"].as_i64().unwrap();
    assert!(resources.database.orders().get(order_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_offer_detail_view() {
    let (app, _) = create_test_app().await;
    let biz = register_business(&app, "studio").await;
    let offer = create_offer(&app, &biz.token, "Logo").await;
    let premium_id = detail_id(&offer, "premium");

    let body: Value = AxumTestRequest::get(&format!("/api/offerdetails/{premium_id}"))
        .token(&biz.token)
        .send(&app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(
        body,
        json!({
            "id": premium_id,
            "title": "Premium Design",
            "revisions": 10,
            "delivery_time_in_days": 10,
            "price": "500.00",
            "features": ["Logo Design", "Visitenkarte", "Briefpapier", "Flyer"],
            "offer_type": "premium"
        })
    );
}
