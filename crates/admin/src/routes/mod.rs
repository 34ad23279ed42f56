//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (backend reachable)
//! GET  /                              - Redirects to /products
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action (backend admin/login)
//! POST /auth/logout                   - Logout
//!
//! # Products
//! GET  /products                      - Table (?category=&status=)
//! GET  /products/new                  - Create form
//! POST /products/new                  - Create
//! GET  /products/{id}/edit            - Edit form
//! POST /products/{id}/edit            - Save
//! POST /products/{id}/status          - Toggle active/inactive (confirm step)
//! POST /products/{id}/delete          - Soft delete (confirm step)
//! POST /products/bulk-status          - Set status of ticked rows (confirm step)
//!
//! # Categories
//! GET  /categories                    - Indented tree
//! GET  /categories/new                - Create form
//! POST /categories/new                - Create
//! GET  /categories/{id}/edit          - Edit form
//! POST /categories/{id}/edit          - Save
//!
//! # Orders (read-only)
//! GET  /orders                        - Table (?status=)
//! GET  /orders/{id}                   - Detail
//!
//! # Users
//! GET  /users                         - Table (?status=)
//! GET  /users/{id}                    - Detail (?addresses=all)
//! POST /users/{id}/status             - Toggle active/inactive (confirm step)
//! POST /users/bulk-status             - Set status of ticked rows (confirm step)
//! ```

pub mod auth;
pub mod categories;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::{Router, response::Redirect, routing::get};

use crate::state::AppState;

/// Create the health routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .merge(auth::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(orders::router())
        .merge(users::router())
        .nest("/health", health_routes())
}
