//! Integration tests for Hearth Home.
//!
//! Each test starts an in-process fake of the Hearth REST backend and the
//! real storefront or admin router on ephemeral ports, then drives them with
//! a cookie-keeping `reqwest` client. Redirects are not followed so tests can
//! assert on post/redirect/get hops.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hearth-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use reqwest::Client;
use secrecy::SecretString;
use serde_json::Value;

/// 64+ characters, as the session layers require.
const TEST_SESSION_SECRET: &str =
    "kV9qT2mW7zR4xN8bL1cF6hJ3sD5gA0pY-uE7iO2wQ9rT4yU1iO6pA3sD8fG5hJ0k";

/// A request the fake backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Fake Hearth REST backend.
pub struct FakeBackend {
    addr: SocketAddr,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeBackend {
    /// Serve `router`, recording every request that reaches it.
    pub async fn start(router: Router) -> Self {
        let log: Arc<Mutex<Vec<Recorded>>> = Arc::default();
        let recorder = Arc::clone(&log);
        let router = router.layer(middleware::from_fn(move |request: Request, next: Next| {
            let log = Arc::clone(&recorder);
            async move { record(&log, request, next).await }
        }));
        let addr = spawn(router).await;
        Self { addr, log }
    }

    /// Base URL the apps should use, ending in `/api/v1`.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests matching a method and path.
    #[must_use]
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

async fn record(log: &Mutex<Vec<Recorded>>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let entry = Recorded {
        method: parts.method.to_string(),
        path: parts.uri.path().to_owned(),
        authorization: parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    };
    log.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(entry);
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Serve a router on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("bind: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("addr: {e}"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// A browser-like client: keeps cookies, does not follow redirects.
#[must_use]
pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_else(|e| panic!("client: {e}"))
}

/// Start the storefront against `backend`, returning its base URL.
pub async fn start_storefront(backend: &FakeBackend) -> String {
    use hearth_storefront::config::{BackendConfig, StorefrontConfig};
    use hearth_storefront::state::AppState;

    let config = StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost".to_owned(),
        session_secret: SecretString::from(TEST_SESSION_SECRET),
        api: BackendConfig {
            url: backend.api_url(),
            timeout: Duration::from_secs(5),
        },
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    };
    let state = AppState::new(config).unwrap_or_else(|e| panic!("state: {e}"));
    let app = hearth_storefront::app(state).unwrap_or_else(|e| panic!("app: {e}"));
    format!("http://{}", spawn(app).await)
}

/// Start the admin panel against `backend`, returning its base URL.
pub async fn start_admin(backend: &FakeBackend) -> String {
    use hearth_admin::config::{AdminConfig, BackendConfig};
    use hearth_admin::state::AppState;

    let config = AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost".to_owned(),
        session_secret: SecretString::from(TEST_SESSION_SECRET),
        api: BackendConfig {
            url: backend.api_url(),
            timeout: Duration::from_secs(5),
        },
        list_cache_ttl: Duration::from_secs(120),
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    };
    let state = AppState::new(config).unwrap_or_else(|e| panic!("state: {e}"));
    let app = hearth_admin::app(state).unwrap_or_else(|e| panic!("app: {e}"));
    format!("http://{}", spawn(app).await)
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
