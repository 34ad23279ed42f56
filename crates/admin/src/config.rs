//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 64 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 8081)
//! - `HEARTH_API_URL` - Backend REST base URL (default: <http://localhost:3000/api/v1>)
//! - `HEARTH_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `ADMIN_LIST_CACHE_SECS` - How long a list page reuses its snapshot (default: 120)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use hearth_core::secret::{WeakSecret, check_session_secret};

const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LIST_CACHE_SECS: u64 = 120;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, WeakSecret),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Hearth REST backend
    pub api: BackendConfig,
    /// Lifetime of a session's cached list snapshot
    pub list_cache_ttl: Duration,
    /// Emit JSON logs
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Where the REST backend lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub timeout: Duration,
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = optional("HEARTH_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url::Url::parse(&url).map_err(|e| invalid("HEARTH_API_URL", e))?;

        Ok(Self {
            url,
            timeout: Duration::from_secs(parsed("HEARTH_API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?),
        })
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the session secret is weak.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            host: parsed("ADMIN_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parsed("ADMIN_PORT", 8081)?,
            base_url: required("ADMIN_BASE_URL")?,
            session_secret: session_secret("ADMIN_SESSION_SECRET")?,
            api: BackendConfig::from_env()?,
            list_cache_ttl: Duration::from_secs(parsed("ADMIN_LIST_CACHE_SECS", DEFAULT_LIST_CACHE_SECS)?),
            json_logs: optional("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn invalid(key: &str, error: impl Display) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), error.to_string())
}

fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Empty values count as unset.
fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    optional(key).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e| invalid(key, e))
    })
}

fn session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    check_session_secret(&value).map_err(|weak| ConfigError::InsecureSecret(key.to_string(), weak))?;
    Ok(SecretString::from(value))
}
