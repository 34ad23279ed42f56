//! Session-related types.
//!
//! Types stored in the session for authentication state, backend
//! credentials, one-shot notices and the search transcript.

use serde::{Deserialize, Serialize};

use hearth_core::UserId;
use hearth_core::account::User;

/// Session-stored customer identity.
///
/// Minimal data kept in the session to greet the logged-in customer and to
/// prefill the checkout form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Backend user id, empty when the login reply carried no profile.
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
}

impl CurrentCustomer {
    /// Identity from the backend profile, falling back to the login email.
    #[must_use]
    pub fn from_login(user: Option<&User>, login_email: &str) -> Self {
        user.map_or_else(
            || Self {
                email: login_email.to_owned(),
                ..Self::default()
            },
            |user| Self {
                id: user.id.clone(),
                full_name: user.full_name.clone(),
                email: if user.email.is_empty() {
                    login_email.to_owned()
                } else {
                    user.email.clone()
                },
                phone_number: user.phone_number.clone(),
            },
        )
    }

    /// Name for the header greeting.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.email
        } else {
            &self.full_name
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

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the backend token and cart id.
    pub const CREDENTIALS: &str = "credentials";

    /// Key for the pending one-shot notice.
    pub const FLASH: &str = "flash";

    /// Key for the AI search transcript.
    pub const SEARCH_TRANSCRIPT: &str = "search_transcript";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_login_without_profile() {
        let customer = CurrentCustomer::from_login(None, "an@mail.vn");
        assert!(customer.id.is_empty());
        assert_eq!(customer.display_name(), "an@mail.vn");
    }

    #[test]
    fn test_from_login_with_profile() {
        let user = User {
            id: UserId::new("u1"),
            full_name: "Nguyen An".into(),
            ..User::default()
        };
        let customer = CurrentCustomer::from_login(Some(&user), "an@mail.vn");
        assert_eq!(customer.email, "an@mail.vn");
        assert_eq!(customer.display_name(), "Nguyen An");
    }

    #[test]
    fn test_flash_classes() {
        assert_eq!(Flash::success("Saved").css_class(), "alert-success");
        assert_eq!(Flash::error("Nope").css_class(), "alert-error");
    }
}
