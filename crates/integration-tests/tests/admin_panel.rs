//! End-to-end tests for the admin panel against a fake backend.

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use hearth_integration_tests::{FakeBackend, browser, location, start_admin};
use reqwest::Client;
use serde_json::{Value, json};

const ADMIN_TOKEN: &str = "admin-jwt";

fn backend() -> Router {
    catalog().route(
        "/api/v1/product/change-status/{id}",
        patch(|| async { Json(json!({"code": 200})) }),
    )
}

/// Everything except the single-product status endpoint.
fn catalog() -> Router {
    Router::new()
        .route(
            "/api/v1/admin/login",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == "hunter22" {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "code": 200,
                            "data": {"_id": "a1", "fullName": "Mai Tran", "email": "mai@hearthhome.vn", "accessToken": ADMIN_TOKEN}
                        })),
                    )
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"code": 401, "message": "Wrong password"})),
                    )
                }
            }),
        )
        .route(
            "/api/v1/product",
            get(|| async {
                Json(json!([{
                    "code": 200,
                    "data": [
                        {"_id": "p1", "title": "Oak chair", "price": 2000000, "status": "active", "product_category_id": "c2", "stock": 4},
                        {"_id": "p2", "title": "Linen sofa", "price": 15000000, "status": "active", "product_category_id": "c1"},
                        {"_id": "p3", "title": "Brass lamp", "price": 900000, "status": "inactive", "product_category_id": "c3"}
                    ]
                }]))
            }),
        )
        .route(
            "/api/v1/product/change-multi",
            patch(|| async { Json(json!({"code": 200, "message": "Updated"})) }),
        )
        .route(
            "/api/v1/product-category",
            get(|| async {
                Json(json!({
                    "code": 200,
                    "data": [
                        {"_id": "c1", "title": "Living room", "status": "active", "subcategories": [
                            {"_id": "c2", "title": "Chairs", "status": "active"}
                        ]},
                        {"_id": "c3", "title": "Lighting", "status": "active"}
                    ]
                }))
            }),
        )
        .route(
            "/api/v1/product-category/create",
            post(|| async { Json(json!({"code": 200, "message": "Created"})) }),
        )
        .route(
            "/api/v1/order/all-orders",
            get(|| async {
                Json(json!({
                    "code": 200,
                    "data": [{
                        "_id": "665f1c2ab7e4a10012345678",
                        "user_infor": {"name": "Lan", "email": "lan@example.vn", "phone": "0901234567", "address": "12 Ly Thai To"},
                        "product": [{"_id": "l1", "product_id": "p1", "price": 2000000, "quantity": 2, "discountPercentage": 10}],
                        "shippingFee": 30000,
                        "orderStatus": [{"status": "Receiving orders"}, {"status": "Delivered"}],
                        "paymentMethod": "cod",
                        "paymentStatus": "paid"
                    }]
                }))
            }),
        )
        .route(
            "/api/v1/listUser",
            get(|| async {
                Json(json!({
                    "code": 200,
                    "data": [{
                        "_id": "u1",
                        "fullName": "Binh Le",
                        "email": "binh@example.vn",
                        "status": "active",
                        "address": [
                            {"street": "1 Hang Bai", "city": "Hanoi", "isDefault": true},
                            {"street": "9 Le Loi", "city": "Da Nang", "isDefault": false}
                        ]
                    }]
                }))
            }),
        )
        .route(
            "/api/v1/listUser/changeStatus/{id}",
            patch(|| async { Json(json!({"code": 200})) }),
        )
}

async fn signed_in(base: &str) -> Client {
    let client = browser();
    let response = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", "mai@hearthhome.vn"), ("password", "hunter22")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("login: {e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/products"));
    client
}

async fn page(client: &Client, url: &str) -> (StatusCode, String) {
    let response = client
        .get(url)
        .send()
        .await
        .unwrap_or_else(|e| panic!("GET {url}: {e}"));
    let status = response.status();
    (status, response.text().await.unwrap_or_default())
}

#[tokio::test]
async fn test_pages_require_login() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;

    for path in ["/products", "/categories", "/orders", "/users/u1"] {
        let response = browser()
            .get(format!("{base}{path}"))
            .send()
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response).as_deref(), Some("/auth/login"));
    }
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_wrong_password_shows_backend_message() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;

    let response = browser()
        .post(format!("{base}/auth/login"))
        .form(&[("email", "mai@hearthhome.vn"), ("password", "nope")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Wrong password"));
}

#[tokio::test]
async fn test_product_table_uses_admin_token_and_filters() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;

    let (status, body) = page(&client, &format!("{base}/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Signed in as Mai Tran"));
    assert!(body.contains("Oak chair"));
    assert!(body.contains("Linen sofa"));
    assert!(body.contains("2.000.000 ₫"));

    let (_, body) = page(&client, &format!("{base}/products?status=inactive")).await;
    assert!(body.contains("Brass lamp"));
    assert!(!body.contains("Oak chair"));

    let (_, body) = page(&client, &format!("{base}/products?category=c1")).await;
    assert!(body.contains("Linen sofa"));
    assert!(!body.contains("Brass lamp"));

    let fetches = backend.requests_to("GET", "/api/v1/product");
    assert_eq!(fetches.len(), 1, "list is served from the session snapshot");
    assert_eq!(
        fetches.first().and_then(|r| r.authorization.as_deref()),
        Some("Bearer admin-jwt")
    );
}

#[tokio::test]
async fn test_bulk_status_confirms_then_updates_snapshot() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;
    let _ = page(&client, &format!("{base}/products")).await;

    let body = "ids=p1&ids=p2&status=inactive&return_to=%2Fproducts%3Fstatus%3Dinactive";
    let response = client
        .post(format!("{base}/products/bulk-status"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::OK);
    let confirm = response.text().await.unwrap_or_default();
    assert!(confirm.contains("Set 2 selected product(s) to inactive?"));
    assert!(confirm.contains(r#"name="ids" value="p1""#));
    assert!(backend.requests_to("PATCH", "/api/v1/product/change-multi").is_empty());

    let response = client
        .post(format!("{base}/products/bulk-status"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(format!("{body}&confirm=yes"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/products?status=inactive"));

    let sent = backend.requests_to("PATCH", "/api/v1/product/change-multi");
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent.first().map(|r| r.body.clone()),
        Some(json!({"ids": ["p1", "p2"], "key": "status", "value": "inactive"}))
    );

    let (_, listing) = page(&client, &format!("{base}/products?status=inactive")).await;
    assert!(listing.contains("2 product(s) set to inactive."));
    assert!(listing.contains("Oak chair"));
    assert!(listing.contains("Linen sofa"));
    assert_eq!(backend.requests_to("GET", "/api/v1/product").len(), 1);
}

#[tokio::test]
async fn test_bulk_status_without_selection_is_refused() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;

    let response = client
        .post(format!("{base}/products/bulk-status"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("status=active&confirm=yes")
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, listing) = page(&client, &format!("{base}/products")).await;
    assert!(listing.contains("Please select at least one item."));
    assert!(backend.requests_to("PATCH", "/api/v1/product/change-multi").is_empty());
}

#[tokio::test]
async fn test_single_status_toggle() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;

    let response = client
        .post(format!("{base}/products/p3/status"))
        .form(&[("return_to", "/products"), ("confirm", "yes")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let sent = backend.requests_to("PATCH", "/api/v1/product/change-status/p3");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent.first().map(|r| r.body.clone()), Some(json!({"status": "active"})));
}

#[tokio::test]
async fn test_plain_ok_replies_count_as_success() {
    let router = catalog()
        .route(
            "/api/v1/product/change-status/{id}",
            patch(|| async { Json(json!({"message": "Status updated"})) }),
        )
        .route("/api/v1/product/delete/{id}", patch(|| async { StatusCode::OK }));
    let backend = FakeBackend::start(router).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;
    let _ = page(&client, &format!("{base}/products")).await;

    let response = client
        .post(format!("{base}/products/p1/status"))
        .form(&[("return_to", "/products?status=inactive"), ("confirm", "yes")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(backend.requests_to("PATCH", "/api/v1/product/change-status/p1").len(), 1);

    let (_, listing) = page(&client, &format!("{base}/products?status=inactive")).await;
    assert!(listing.contains("is now inactive."));
    assert!(!listing.contains("alert-error"));
    assert!(listing.contains("Oak chair"));
    assert_eq!(backend.requests_to("GET", "/api/v1/product").len(), 1);

    let response = client
        .post(format!("{base}/products/p2/delete"))
        .form(&[("return_to", "/products"), ("confirm", "yes")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(backend.requests_to("PATCH", "/api/v1/product/delete/p2").len(), 1);

    let (_, listing) = page(&client, &format!("{base}/products")).await;
    assert!(listing.contains("was deleted."));
    assert!(!listing.contains("alert-error"));
}

#[tokio::test]
async fn test_category_title_is_required() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;

    let response = client
        .post(format!("{base}/categories/new"))
        .form(&[("title", "  "), ("parent_id", "c1"), ("status", "active")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Category title is required."));
    assert!(backend.requests_to("POST", "/api/v1/product-category/create").is_empty());

    let response = client
        .post(format!("{base}/categories/new"))
        .form(&[("title", "Armchairs"), ("parent_id", "c1"), ("status", "active")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let sent = backend.requests_to("POST", "/api/v1/product-category/create");
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent.first().and_then(|r| r.body["parent_id"].as_str().map(str::to_owned)),
        Some("c1".to_owned())
    );
}

#[tokio::test]
async fn test_category_tree_is_indented() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;

    let (status, body) = page(&client, &format!("{base}/categories")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<td class="depth-1">Chairs</td>"#));
}

#[tokio::test]
async fn test_order_detail_from_list() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;

    let (_, listing) = page(&client, &format!("{base}/orders?status=Delivered")).await;
    assert!(listing.contains("#345678"));

    let (status, detail) = page(&client, &format!("{base}/orders/665f1c2ab7e4a10012345678")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(detail.contains("Oak chair"));
    assert!(detail.contains("3.630.000 ₫"));
    assert!(detail.contains("Completed"));

    let (status, _) = page(&client, &format!("{base}/orders/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_detail_address_toggle() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;

    let (_, detail) = page(&client, &format!("{base}/users/u1")).await;
    assert!(detail.contains("1 Hang Bai, Hanoi"));
    assert!(!detail.contains("9 Le Loi"));
    assert!(detail.contains("Show all addresses"));

    let (_, detail) = page(&client, &format!("{base}/users/u1?addresses=all")).await;
    assert!(detail.contains("9 Le Loi, Da Nang"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;
    let client = signed_in(&base).await;

    let response = client
        .post(format!("{base}/auth/logout"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));

    let response = client
        .get(format!("{base}/products"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_health_probes() {
    let backend = FakeBackend::start(backend()).await;
    let base = start_admin(&backend).await;

    let (status, body) = page(&browser(), &format!("{base}/health")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "ok"));
    let (status, _) = page(&browser(), &format!("{base}/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
}
