//! REST client for the Hearth backend (`/api/v1`).
//!
//! Only available with the `client` feature. Both binaries build their
//! screen-specific calls on top of [`ApiClient`]; it owns transport concerns:
//! URL building, auth forwarding, status mapping and JSON decoding.
//!
//! The backend authenticates with a bearer token and also reads `token` and
//! `cartId` cookies. The browser never talks to the backend directly, so
//! both are kept in the server-side session as [`Credentials`] and forwarded
//! on every call.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use reqwest::cookie::Cookie;
use reqwest::header::{AUTHORIZATION, COOKIE, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::account::User;
use crate::envelope::{Envelope, EnvelopeError, error_message};

/// Errors that can occur when talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("backend returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// 401/403 from the backend.
    #[error("not authorized{}", .0.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unauthorized(Option<String>),

    /// 404 from the backend.
    #[error("not found: {0}")]
    NotFound(String),

    /// 429 from the backend.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The body was not JSON.
    #[error("invalid JSON from backend: {0}")]
    Parse(#[from] serde_json::Error),

    /// JSON, but not in the expected envelope or shape.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The configured base URL cannot carry a path.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Backend-provided message, when there is one.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Unauthorized(message) => message.as_deref(),
            Self::Envelope(e) => e.message(),
            Self::NotFound(_)
            | Self::Transport(_)
            | Self::RateLimited(_)
            | Self::Parse(_)
            | Self::InvalidUrl(_) => None,
        }
    }

    /// Text for an alert banner: the backend message or a generic line.
    #[must_use]
    pub fn user_message(&self) -> String {
        if let Some(message) = self.backend_message() {
            return message.to_owned();
        }
        match self {
            Self::Transport(_) => "Could not reach the server. Please try again.".to_owned(),
            Self::RateLimited(_) => "Too many requests. Please wait a moment.".to_owned(),
            Self::Unauthorized(_) => "Please log in to continue.".to_owned(),
            Self::NotFound(_) => "The requested item was not found.".to_owned(),
            Self::Status { .. } | Self::Parse(_) | Self::Envelope(_) | Self::InvalidUrl(_) => {
                "The server returned an unexpected response.".to_owned()
            }
        }
    }

    /// Whether this is the backend's fault rather than the user's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Transport(_) | Self::Parse(_) | Self::InvalidUrl(_) => true,
            Self::Unauthorized(_) | Self::NotFound(_) | Self::RateLimited(_) | Self::Envelope(_) => {
                false
            }
        }
    }
}

/// Backend credentials carried in a user's session.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: Option<String>,
    #[serde(rename = "cartId")]
    pub cart_id: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("cart_id", &self.cart_id)
            .finish()
    }
}

impl Credentials {
    /// No token and no cart.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            token: None,
            cart_id: None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub const fn has_cart(&self) -> bool {
        self.cart_id.is_some()
    }

    fn cookie_header(&self) -> Option<String> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(token) = &self.token {
            pairs.push(format!("token={token}"));
        }
        if let Some(cart_id) = &self.cart_id {
            pairs.push(format!("cartId={cart_id}"));
        }
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        };
        match self.cookie_header() {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }
}

/// A decoded response plus any cookies the backend tried to set.
#[derive(Debug, Clone)]
pub struct Reply {
    pub body: Value,
    pub cookies: Vec<(String, String)>,
}

impl Reply {
    /// Value of a cookie set by the backend.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Client for the Hearth REST backend.
///
/// Cheap to clone; the connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client for `base_url` (e.g. `http://localhost:3000/api/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if the URL does not parse or
    /// cannot carry a path, and [`BackendError::Transport`] if the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base_url =
            Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hearth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { http, base_url }),
        })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded;
    /// a trailing `""` segment produces a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET` with query parameters.
    ///
    /// # Errors
    ///
    /// See [`BackendError`].
    pub async fn get(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        auth: &Credentials,
    ) -> Result<Value, BackendError> {
        let url = self.endpoint(segments)?;
        let request = self.inner.http.get(url.clone()).query(query);
        Ok(self.execute(Method::GET, &url, request, auth).await?.body)
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`BackendError`].
    pub async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        segments: &[&str],
        body: &B,
        auth: &Credentials,
    ) -> Result<Value, BackendError> {
        Ok(self.send_json(Method::POST, segments, body, auth).await?.body)
    }

    /// `PATCH` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`BackendError`].
    pub async fn patch<B: Serialize + ?Sized + Sync>(
        &self,
        segments: &[&str],
        body: &B,
        auth: &Credentials,
    ) -> Result<Value, BackendError> {
        Ok(self.send_json(Method::PATCH, segments, body, auth).await?.body)
    }

    /// Send a JSON body and keep the cookies from the response. Used for
    /// login, where the backend hands out `token` and `cartId` as cookies.
    ///
    /// # Errors
    ///
    /// See [`BackendError`].
    pub async fn send_json<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
        auth: &Credentials,
    ) -> Result<Reply, BackendError> {
        let url = self.endpoint(segments)?;
        let request = self.inner.http.request(method.clone(), url.clone()).json(body);
        self.execute(method, &url, request, auth).await
    }

    /// `POST` a multipart form.
    ///
    /// # Errors
    ///
    /// See [`BackendError`].
    pub async fn post_multipart(
        &self,
        segments: &[&str],
        form: reqwest::multipart::Form,
        auth: &Credentials,
    ) -> Result<Value, BackendError> {
        let url = self.endpoint(segments)?;
        let request = self.inner.http.post(url.clone()).multipart(form);
        Ok(self.execute(Method::POST, &url, request, auth).await?.body)
    }

    /// Check the backend answers at all. Any HTTP response counts.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Transport`] when nothing answers.
    pub async fn ping(&self) -> Result<(), BackendError> {
        self.inner
            .http
            .head(self.inner.base_url.clone())
            .send()
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(method = %method, path = %url.path()))]
    async fn execute(
        &self,
        method: Method,
        url: &Url,
        request: RequestBuilder,
        auth: &Credentials,
    ) -> Result<Reply, BackendError> {
        let response = auth.apply(request).send().await.map_err(|e| {
            error!(error = %e, "Backend request failed");
            BackendError::Transport(e)
        })?;

        let status = response.status();
        let cookies = response
            .cookies()
            .filter(is_live)
            .map(|c| (c.name().to_owned(), c.value().to_owned()))
            .collect::<Vec<_>>();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            warn!(retry_after, "Backend rate limited the request");
            return Err(BackendError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .as_ref()
                .and_then(error_message);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    debug!(status = %status, "Backend refused credentials");
                    BackendError::Unauthorized(message)
                }
                StatusCode::NOT_FOUND => {
                    debug!("Backend resource not found");
                    BackendError::NotFound(message.unwrap_or_else(|| url.path().to_owned()))
                }
                _ => {
                    if status.is_server_error() {
                        error!(
                            status = %status,
                            body = %text.chars().take(500).collect::<String>(),
                            "Backend returned server error"
                        );
                    } else {
                        warn!(status = %status, message = ?message, "Backend rejected request");
                    }
                    BackendError::Status {
                        status: status.as_u16(),
                        message,
                    }
                }
            });
        }

        if text.trim().is_empty() {
            return Ok(Reply {
                body: Value::Null,
                cookies,
            });
        }

        let body = serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })?;

        Ok(Reply { body, cookies })
    }
}

/// Credentials and profile handed out by a login endpoint.
#[derive(Debug, Clone)]
pub struct Login {
    pub credentials: Credentials,
    /// The account, when the backend included it.
    pub user: Option<User>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Log in against `segments` (`user/login` or `admin/login`).
    ///
    /// # Errors
    ///
    /// [`BackendError::Unauthorized`] when the backend refused or handed out
    /// no token, plus the usual transport errors.
    pub async fn login(
        &self,
        segments: &[&str],
        email: &str,
        password: &str,
    ) -> Result<Login, BackendError> {
        let reply = self
            .send_json(
                Method::POST,
                segments,
                &LoginRequest { email, password },
                &Credentials::anonymous(),
            )
            .await?;
        Login::from_reply(&reply)
    }
}

impl Login {
    /// Pull the token, cart id and account out of a login reply.
    ///
    /// The token may sit at the top level, under `data` or under `user`, as
    /// `accessToken` or `token`, or only in a `Set-Cookie` header.
    ///
    /// # Errors
    ///
    /// [`BackendError::Envelope`] for an explicit rejection and
    /// [`BackendError::Unauthorized`] when no token can be found.
    pub fn from_reply(reply: &Reply) -> Result<Self, BackendError> {
        let body = &reply.body;
        if let Err(rejected @ EnvelopeError::Rejected { .. }) = Envelope::parse(body.clone()) {
            return Err(rejected.into());
        }

        let data = body.get("data");
        let scopes: Vec<&Value> = [
            Some(body),
            data,
            body.get("user"),
            data.and_then(|d| d.get("user")),
        ]
        .into_iter()
        .flatten()
        .collect();

        let token = find_str(&scopes, &["accessToken", "token"])
            .or_else(|| reply.cookie("token").map(str::to_owned))
            .ok_or_else(|| BackendError::Unauthorized(error_message(body)))?;
        let cart_id =
            find_str(&scopes, &["cartId"]).or_else(|| reply.cookie("cartId").map(str::to_owned));

        let user = scopes
            .iter()
            .rev()
            .find(|scope| scope.get("_id").is_some())
            .and_then(|scope| serde_json::from_value::<User>((*scope).clone()).ok());

        Ok(Self {
            credentials: Credentials {
                token: Some(token),
                cart_id,
            },
            user,
        })
    }
}

fn find_str(scopes: &[&Value], keys: &[&str]) -> Option<String> {
    scopes.iter().find_map(|scope| {
        keys.iter().find_map(|key| {
            scope
                .get(*key)
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        })
    })
}

/// Cookies the backend clears (empty, `Max-Age=0` or already expired) are
/// not worth forwarding.
fn is_live(cookie: &Cookie<'_>) -> bool {
    !cookie.value().is_empty()
        && cookie.max_age() != Some(Duration::ZERO)
        && cookie.expires().is_none_or(|at| at > SystemTime::now())
}
