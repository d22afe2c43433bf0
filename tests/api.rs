//! End-to-end tests of the HTTP surface against an in-memory SQLite store.

use std::sync::Arc;

use product_catalog::config::Environment;
use product_catalog::error::{CONSTRAINT_DETAIL, GENERIC_ERROR_DETAIL};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

mod common;

use common::{spawn_seeded, spawn_with_store, FailingStore, PanickingStore};

async fn post_product(client: &reqwest::Client, url: &str, body: Value) -> reqwest::Response {
    client.post(url).json(&body).send().await.unwrap()
}

#[tokio::test]
async fn list_returns_seeded_products_newest_first() {
    let server = spawn_seeded().await;

    let res = reqwest::get(server.url("/products")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let products: Vec<Value> = res.json().await.unwrap();

    assert_eq!(products.len(), 3);
    let names: Vec<&str> = products.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Sample Product 3", "Sample Product 2", "Sample Product 1"]);
    assert_eq!(products[2]["price"], json!(10.99));
    assert_eq!(products[2]["description"], "A sample product for testing.");
    assert!(products[0]["createdAt"].is_string());
    assert!(products[0]["updatedAt"].is_null());
}

#[tokio::test]
async fn unknown_product_is_404_problem() {
    let server = spawn_seeded().await;

    let res = reqwest::get(server.url("/products/99999")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/problem+json");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["title"], "Not Found");
}

#[tokio::test]
async fn non_positive_or_non_numeric_ids_are_400() {
    let server = spawn_seeded().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/products/0")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"]["id"][0], "Product ID must be greater than 0");

    let res = client.delete(server.url("/products/-3")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(server.url("/products/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn create_with_empty_name_reports_field_error() {
    let server = spawn_seeded().await;
    let client = reqwest::Client::new();

    let res = post_product(&client, &server.url("/products"), json!({ "name": "", "price": 5.0 })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"]["name"][0], "Product name is required");
    assert!(body["errors"].get("price").is_none());

    let res = reqwest::get(server.url("/products")).await.unwrap();
    let products: Vec<Value> = res.json().await.unwrap();
    assert_eq!(products.len(), 3);
}

#[tokio::test]
async fn create_enforces_price_bounds() {
    let server = spawn_seeded().await;
    let client = reqwest::Client::new();
    let url = server.url("/products");

    for price in [json!(0), json!(-1.5), json!(1000000.00)] {
        let res = post_product(&client, &url, json!({ "name": "P", "price": price })).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "price {price}");
        let body: Value = res.json().await.unwrap();
        assert!(body["errors"]["price"].is_array(), "price {price}");
    }

    for price in [json!(0.01), json!(999999.99)] {
        let res = post_product(&client, &url, json!({ "name": "P", "price": price })).await;
        assert_eq!(res.status(), StatusCode::CREATED, "price {price}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["price"], price);
    }
}

#[tokio::test]
async fn create_rejects_overlong_fields_and_bad_json() {
    let server = spawn_seeded().await;
    let client = reqwest::Client::new();
    let url = server.url("/products");

    let res = post_product(
        &client,
        &url,
        json!({ "name": "n".repeat(101), "price": 1, "description": "d".repeat(501) }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["description"].is_array());

    let res = client
        .post(&url)
        .header(header::CONTENT_TYPE, "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_sets_location_header() {
    let server = spawn_seeded().await;
    let client = reqwest::Client::new();

    let res = post_product(
        &client,
        &server.url("/products"),
        json!({ "name": "Widget", "price": 10.99, "description": "x" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()[header::LOCATION].to_str().unwrap().to_string();
    let body: Value = res.json().await.unwrap();

    let id = body["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(location, format!("/products/{id}"));
    assert_eq!(body["name"], "Widget");
    assert_eq!(body["price"], json!(10.99));
    assert_eq!(body["description"], "x");
    assert!(body["updatedAt"].is_null());
}

#[tokio::test]
async fn full_lifecycle() {
    let server = spawn_seeded().await;
    let client = reqwest::Client::new();

    let created: Value = post_product(
        &client,
        &server.url("/products"),
        json!({ "name": "Lamp", "price": 19.5 }),
    )
    .await
    .json()
    .await
    .unwrap();
    let item = server.url(&format!("/products/{}", created["id"]));

    let res = client.get(&item).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched, created);

    let res = client
        .put(&item)
        .json(&json!({ "name": "Desk Lamp", "price": 24.99, "description": "LED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert!(updated["updatedAt"].is_string());

    let fetched: Value = client.get(&item).send().await.unwrap().json().await.unwrap();
    assert_eq!(fetched["name"], "Desk Lamp");
    assert_eq!(fetched["price"], json!(24.99));
    assert_eq!(fetched["description"], "LED");

    let res = client.delete(&item).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(&item).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(&item).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_unknown_product_is_404() {
    let server = spawn_seeded().await;
    let res = reqwest::Client::new()
        .put(server.url("/products/424242"))
        .json(&json!({ "name": "Ghost", "price": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_failure_is_generic_in_production() {
    let server = spawn_with_store(Arc::new(FailingStore), Environment::Production).await;

    let res = reqwest::get(server.url("/products")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], GENERIC_ERROR_DETAIL);
    assert_eq!(body["status"], 500);
}

#[tokio::test]
async fn store_failure_shows_detail_in_development() {
    let server = spawn_with_store(Arc::new(FailingStore), Environment::Development).await;

    let res = reqwest::get(server.url("/products/1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/problem+json");
    let body: Value = res.json().await.unwrap();
    let detail = body["detail"].as_str().unwrap();
    assert_ne!(detail, GENERIC_ERROR_DETAIL);
    assert!(detail.contains("database error"), "{detail}");
}

#[tokio::test]
async fn panics_become_500() {
    let server = spawn_with_store(Arc::new(PanickingStore), Environment::Development).await;

    let res = reqwest::get(server.url("/products")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], GENERIC_ERROR_DETAIL);

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn constraint_violation_is_400() {
    let server = spawn_with_store(Arc::new(PanickingStore), Environment::Production).await;

    let res = post_product(
        &reqwest::Client::new(),
        &server.url("/products"),
        json!({ "name": "P", "price": 1 }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], CONSTRAINT_DETAIL);
}

#[tokio::test]
async fn price_that_rounds_to_zero_is_a_field_error() {
    let server = spawn_seeded().await;
    let client = reqwest::Client::new();

    let res = post_product(&client, &server.url("/products"), json!({ "name": "Dust", "price": 0.004 })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"]["price"][0], "Product price must be greater than 0");
    assert!(!body.to_string().contains("CHECK"));

    let res = client
        .put(server.url("/products/1"))
        .json(&json!({ "name": "Dust", "price": 0.004 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let fetched: Value = reqwest::get(server.url("/products/1")).await.unwrap().json().await.unwrap();
    assert_eq!(fetched["name"], "Sample Product 1");
}

#[tokio::test]
async fn health_and_connection_check() {
    let server = spawn_seeded().await;

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Healthy");

    let res = reqwest::get(server.url("/test-connection")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("successful"));

    let failing = spawn_with_store(Arc::new(FailingStore), Environment::Production).await;
    let res = reqwest::get(failing.url("/test-connection")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn every_response_carries_security_headers() {
    let server = spawn_seeded().await;

    for path in ["/health", "/products", "/products/99999"] {
        let res = reqwest::get(server.url(path)).await.unwrap();
        let headers = res.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff", "{path}");
        assert_eq!(headers["x-frame-options"], "DENY", "{path}");
        assert_eq!(headers["x-xss-protection"], "1; mode=block", "{path}");
        assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin", "{path}");
    }
}
