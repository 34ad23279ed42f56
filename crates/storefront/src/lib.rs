//! Hearth Home storefront library.
//!
//! The storefront is a backend-for-frontend: it renders HTML for customers
//! and talks to the Hearth REST backend for everything it shows. Exposed as
//! a library so the router can be driven by integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod views;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::KeyError;

use state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the full application router.
///
/// # Errors
///
/// Returns [`KeyError`] if the session secret cannot produce a signing key.
pub fn app(state: AppState) -> Result<Router, KeyError> {
    let session_layer = middleware::create_session_layer(state.config())?;

    Ok(Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}
