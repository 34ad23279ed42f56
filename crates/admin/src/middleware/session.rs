//! Session middleware configuration for admin.
//!
//! Sessions live in memory behind a signed cookie, with stricter settings
//! than the storefront (SameSite=Strict, 24hr expiry).

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, KeyError, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "hearth_admin_session";

/// Session expiry time in seconds (24 hours - stricter than storefront).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the signed-cookie session layer.
///
/// # Errors
///
/// Returns [`KeyError`] if the session secret is shorter than 64 bytes.
pub fn create_session_layer(
    config: &AdminConfig,
) -> Result<SessionManagerLayer<MemoryStore, SignedCookie>, KeyError> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        // SameSite=Strict for admin (stricter than storefront's Lax)
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
