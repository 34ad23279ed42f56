//! Hearth Home admin library.
//!
//! The back-office panel for products, categories, orders and user
//! accounts. Every change goes through the Hearth REST backend's admin
//! endpoints with the token from the admin's login. Exposed as a library so
//! the router can be driven by integration tests.
//!
//! # Security
//!
//! Admin sessions carry a backend token that can edit the catalog and lock
//! accounts. Cookies are `SameSite=Strict` and pages are served with a
//! stricter CSP than the storefront.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod views;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::cookie::KeyError;
use tracing::Span;

use state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = "crates/admin/static";

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
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}
