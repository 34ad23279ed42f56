//! One-shot notices carried across a redirect.

use tower_sessions::Session;

use crate::models::{Flash, session_keys};

/// Queue a notice for the next rendered page.
///
/// Failing to store it only loses the notice, so the error is logged and
/// swallowed.
pub async fn push_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending notice, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}
