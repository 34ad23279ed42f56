//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page (featured + latest)
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (backend reachable)
//!
//! # Products
//! GET  /products                      - All products (?page=)
//! GET  /products/new                  - Newest first
//! GET  /products/featured             - Featured only
//! GET  /products/category/{slug}      - Category and its direct subcategories
//! GET  /products/{slug}               - Product detail + related products
//!
//! # Cart
//! GET  /cart                          - Cart page
//! POST /cart/add/{product_id}         - Add (quantity form field)
//! POST /cart/update/{product_id}      - Set quantity (minimum 1)
//! POST /cart/remove/{product_id}      - Remove line
//! GET  /cart/count                    - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout                      - Summary + delivery form
//! POST /checkout                      - Place order
//! GET  /order-confirmation            - Thank-you page
//!
//! # Account (requires auth)
//! GET  /account                       - Profile
//! POST /account                       - Save profile
//! GET  /account/password              - Password form
//! POST /account/password              - Change password
//! GET  /account/orders                - Order history
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action
//! POST /auth/logout                   - Logout action
//!
//! # AI search
//! GET  /search                        - Transcript
//! POST /search                        - Ask (keyword and/or room photo)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod products;
pub mod search;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Largest accepted room photo upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/new", get(products::new_arrivals))
        .route("/featured", get(products::featured))
        .route("/category/{slug}", get(products::category))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{product_id}", post(cart::add))
        .route("/update/{product_id}", post(cart::update))
        .route("/remove/{product_id}", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::show).post(account::update))
        .route(
            "/password",
            get(account::password_page).post(account::change_password),
        )
        .route("/orders", get(account::orders))
}

/// Create the health routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .route("/order-confirmation", get(checkout::confirmation))
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
        .route(
            "/search",
            get(search::show)
                .post(search::ask)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .nest("/health", health_routes())
}
