//! End-to-end tests for the storefront against a fake backend.

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use hearth_integration_tests::{FakeBackend, browser, location, start_storefront};
use serde_json::json;

fn backend() -> Router {
    Router::new()
        .route(
            "/api/v1/products/",
            get(|| async {
                Json(json!([{
                    "code": 200,
                    "data": [
                        {"_id": "p1", "title": "Oak chair", "slug": "oak-chair", "price": 2000000, "stock": 3, "featured": "1", "status": "active"},
                        {"_id": "p2", "title": "Linen sofa", "slug": "linen-sofa", "price": 15000000, "discountPercentage": 20, "stock": 1, "status": "active"}
                    ]
                }]))
            }),
        )
        .route(
            "/api/v1/product-category",
            get(|| async {
                Json(json!({
                    "code": 200,
                    "data": [{"_id": "c1", "title": "Living room", "description": "living-room", "status": "active"}]
                }))
            }),
        )
        .route(
            "/api/v1/user/login",
            post(|| async {
                Json(json!({
                    "code": 200,
                    "data": {"_id": "u1", "fullName": "Lan Pham", "email": "lan@example.vn", "accessToken": "customer-jwt", "cartId": "cart-7"}
                }))
            }),
        )
        .route(
            "/api/v1/cart/",
            get(|| async { Json(json!({"status": "success", "data": null})) }),
        )
        .route(
            "/api/v1/cart/add/{product_id}",
            post(|| async { Json(json!({"status": "success"})) }),
        )
        .route(
            "/api/v1/cart/update/{product_id}/{quantity}",
            get(|| async { Json(json!({"status": "success"})) }),
        )
}

#[tokio::test]
async fn test_home_lists_catalog() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_storefront(&backend).await;

    let response = browser()
        .get(format!("{base}/"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Oak chair"));
    assert!(body.contains("Linen sofa"));
    assert!(body.contains("Living room"));
}

#[tokio::test]
async fn test_anonymous_add_to_cart_goes_to_login() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_storefront(&backend).await;

    let response = browser()
        .post(format!("{base}/cart/add/p1"))
        .form(&[("quantity", "1")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
    assert!(backend.requests_to("POST", "/api/v1/cart/add/p1").is_empty());
}

#[tokio::test]
async fn test_login_then_add_to_cart_forwards_token() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_storefront(&backend).await;
    let client = browser();

    let response = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", "lan@example.vn"), ("password", "s3cret-pass")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));

    let response = client
        .post(format!("{base}/cart/add/p1"))
        .form(&[("quantity", "2"), ("return_to", "/products/oak-chair")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/products/oak-chair"));

    let sent = backend.requests_to("POST", "/api/v1/cart/add/p1");
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent.first().and_then(|r| r.authorization.as_deref()),
        Some("Bearer customer-jwt")
    );
    assert_eq!(sent.first().map(|r| r.body.clone()), Some(json!({"quantity": 2})));
}

#[tokio::test]
async fn test_unreadable_quantity_becomes_one() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_storefront(&backend).await;
    let client = browser();

    let response = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", "lan@example.vn"), ("password", "s3cret-pass")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    for quantity in ["abc", "", "-3"] {
        let response = client
            .post(format!("{base}/cart/update/p1"))
            .form(&[("quantity", quantity)])
            .send()
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{quantity:?}");
        assert_eq!(location(&response).as_deref(), Some("/cart"));
    }
    assert_eq!(backend.requests_to("GET", "/api/v1/cart/update/p1/1").len(), 3);
}

#[tokio::test]
async fn test_checkout_requires_login() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_storefront(&backend).await;

    let response = browser()
        .get(format!("{base}/checkout"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_health() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_storefront(&backend).await;

    let response = browser()
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::OK);
}
