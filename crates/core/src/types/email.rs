//! Email address type.
//!
//! Used to validate the login form and the checkout delivery form before
//! anything is sent to the backend. The backend does its own validation; this
//! only catches obvious typos early so the customer keeps their form input.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("email cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain a single @ symbol")]
    AtSymbol,
    /// The local part (before @) or the domain (after @) is empty.
    #[error("email must have text on both sides of the @")]
    MissingPart,
    /// The domain has no dot, so it cannot be delivered to.
    #[error("email domain must contain a dot")]
    BareDomain,
    /// The input contains whitespace inside the address.
    #[error("email cannot contain spaces")]
    Whitespace,
}

/// A trimmed, structurally valid email address.
///
/// ```
/// use hearth_core::Email;
///
/// assert_eq!(Email::parse("  an@hearthhome.vn ").map(|e| e.to_string()).ok(),
///            Some("an@hearthhome.vn".to_string()));
/// assert!(Email::parse("an@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first problem found.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::AtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::AtSymbol);
        }
        if local.is_empty() || domain.is_empty() {
            return Err(EmailError::MissingPart);
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(EmailError::BareDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("khach@hearthhome.vn").is_ok());
        assert!(Email::parse("first.last+tag@mail.example.com").is_ok());
    }

    #[test]
    fn test_parse_trims_input() {
        let email = Email::parse("  khach@hearthhome.vn\n");
        assert_eq!(email.map(Email::into_inner), Ok("khach@hearthhome.vn".to_string()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at-symbol"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c.vn"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@hearthhome.vn"), Err(EmailError::MissingPart));
        assert_eq!(Email::parse("khach@"), Err(EmailError::MissingPart));
        assert_eq!(Email::parse("khach@localhost"), Err(EmailError::BareDomain));
        assert_eq!(Email::parse("kh ach@mail.vn"), Err(EmailError::Whitespace));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@hearthhome.vn", "a".repeat(250));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong { max: 254 }));
    }
}
