//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state, the backend token
//! and one-shot notices.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hearth_core::UserId;
use hearth_core::account::User;

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Backend account id, empty when the login reply carried no profile.
    pub id: UserId,
    /// Admin's email address.
    pub email: String,
    /// Admin's display name.
    pub name: String,
    /// Key under which this session's list snapshots are cached.
    pub cache_scope: String,
}

impl CurrentAdmin {
    /// Identity from the login reply, with a fresh cache scope.
    #[must_use]
    pub fn from_login(user: Option<&User>, login_email: &str) -> Self {
        let (id, email, name) = match user {
            Some(user) => (
                user.id.clone(),
                if user.email.is_empty() {
                    login_email.to_owned()
                } else {
                    user.email.clone()
                },
                user.full_name.clone(),
            ),
            None => (UserId::default(), login_email.to_owned(), String::new()),
        };
        Self {
            id,
            name: if name.is_empty() { email.clone() } else { name },
            email,
            cache_scope: Uuid::new_v4().to_string(),
        }
    }
}

/// Tone of a one-shot notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// A notice shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// CSS modifier for the alert banner.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "alert-success",
            FlashKind::Error => "alert-error",
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the backend token.
    pub const CREDENTIALS: &str = "credentials";

    /// Key for the pending one-shot notice.
    pub const FLASH: &str = "flash";
}
