//! User accounts and status management.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::lenient;
use crate::types::{ActiveStatus, ProductId, StatusFilter, UserId};

/// A saved delivery address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, deserialize_with = "lenient::string")]
    pub street: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub ward: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub district: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub city: String,
    #[serde(rename = "isDefault", default, deserialize_with = "lenient::flag")]
    pub is_default: bool,
}

impl Address {
    /// `street, ward, district, city` with blank parts skipped.
    #[must_use]
    pub fn one_line(&self) -> String {
        [&self.street, &self.ward, &self.district, &self.city]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A customer or staff account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: UserId,
    #[serde(rename = "fullName", default, deserialize_with = "lenient::string")]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(rename = "phoneNumber", default, deserialize_with = "lenient::string")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub position: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: ActiveStatus,
    #[serde(rename = "address", alias = "addresses", default, deserialize_with = "lenient::list")]
    pub addresses: Vec<Address>,
}

impl User {
    /// Addresses shown before the "show all" toggle is used.
    ///
    /// With a single address it is always shown; with several only the
    /// default ones are, until `show_all` is set.
    #[must_use]
    pub fn visible_addresses(&self, show_all: bool) -> Vec<&Address> {
        if show_all || self.addresses.len() <= 1 {
            self.addresses.iter().collect()
        } else {
            self.addresses.iter().filter(|a| a.is_default).collect()
        }
    }

    /// Whether the view needs an address toggle at all.
    #[must_use]
    pub fn has_address_toggle(&self) -> bool {
        self.addresses.len() > 1
    }
}

/// Body of `my-accountClient/edit`.
///
/// The same endpoint saves the profile and changes the password; an empty
/// `passWord` leaves the password unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub avatar: String,
    pub position: String,
    pub status: ActiveStatus,
    #[serde(rename = "passWord")]
    pub password: String,
}

impl ProfileUpdate {
    /// Build a profile save. Blank position defaults to `"1"`, an unknown
    /// status to active.
    #[must_use]
    pub fn new(
        full_name: &str,
        email: &str,
        phone_number: &str,
        avatar: &str,
        position: &str,
        status: ActiveStatus,
    ) -> Self {
        let position = position.trim();
        Self {
            full_name: full_name.trim().to_owned(),
            email: email.trim().to_owned(),
            phone_number: phone_number.trim().to_owned(),
            avatar: avatar.trim().to_owned(),
            position: if position.is_empty() { "1" } else { position }.to_owned(),
            status: match status {
                ActiveStatus::Inactive => ActiveStatus::Inactive,
                ActiveStatus::Active | ActiveStatus::Unknown => ActiveStatus::Active,
            },
            password: String::new(),
        }
    }

    /// Prefill from the current account.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self::new(
            &user.full_name,
            &user.email,
            &user.phone_number,
            user.avatar.as_deref().unwrap_or_default(),
            &user.position,
            user.status,
        )
    }

    /// Turn the update into a password change.
    #[must_use]
    pub fn with_password(mut self, password: String) -> Self {
        self.password = password;
        self
    }
}

/// Why a password change was refused before reaching the backend.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Please fill in both password fields.")]
    Missing,
    #[error("Passwords do not match.")]
    Mismatch,
}

/// Check the new password and its confirmation.
///
/// # Errors
///
/// [`PasswordError::Missing`] when either field is empty,
/// [`PasswordError::Mismatch`] when they differ.
pub fn validate_password_change<'a>(
    new_password: &'a str,
    confirm_password: &str,
) -> Result<&'a str, PasswordError> {
    if new_password.is_empty() || confirm_password.is_empty() {
        return Err(PasswordError::Missing);
    }
    if new_password != confirm_password {
        return Err(PasswordError::Mismatch);
    }
    Ok(new_password)
}

/// Body of the single-item `change-status` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub status: ActiveStatus,
}

/// Body of the `change-multi` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkStatusChange {
    pub ids: Vec<String>,
    pub key: &'static str,
    pub value: ActiveStatus,
}

/// Why a bulk action was refused before reaching the backend.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkError {
    #[error("Please select at least one item.")]
    NothingSelected,
    #[error("Choose active or inactive.")]
    InvalidStatus,
}

impl BulkStatusChange {
    /// Validate a selection.
    ///
    /// # Errors
    ///
    /// [`BulkError::NothingSelected`] for an empty selection and
    /// [`BulkError::InvalidStatus`] for a target other than active/inactive.
    pub fn new(ids: Vec<String>, value: ActiveStatus) -> Result<Self, BulkError> {
        let ids: Vec<String> = ids.into_iter().filter(|id| !id.trim().is_empty()).collect();
        if ids.is_empty() {
            return Err(BulkError::NothingSelected);
        }
        if value == ActiveStatus::Unknown {
            return Err(BulkError::InvalidStatus);
        }
        Ok(Self {
            ids,
            key: "status",
            value,
        })
    }
}

/// A list row whose status can be changed in place.
pub trait StatusRecord {
    fn record_id(&self) -> &str;
    fn status(&self) -> ActiveStatus;
    fn set_status(&mut self, status: ActiveStatus);
}

impl StatusRecord for User {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn status(&self) -> ActiveStatus {
        self.status
    }

    fn set_status(&mut self, status: ActiveStatus) {
        self.status = status;
    }
}

impl StatusRecord for Product {
    fn record_id(&self) -> &str {
        ProductId::as_str(&self.id)
    }

    fn status(&self) -> ActiveStatus {
        self.status
    }

    fn set_status(&mut self, status: ActiveStatus) {
        self.status = status;
    }
}

/// Apply a confirmed status change to a cached list.
///
/// Only rows whose id is in `ids` are touched. Returns how many changed.
pub fn apply_status_change<T, S>(rows: &mut [T], ids: &[S], status: ActiveStatus) -> usize
where
    T: StatusRecord,
    S: AsRef<str>,
{
    let mut changed = 0;
    for row in rows.iter_mut() {
        if ids.iter().any(|id| id.as_ref() == row.record_id()) {
            row.set_status(status);
            changed += 1;
        }
    }
    changed
}

/// Rows passing a status filter.
#[must_use]
pub fn filter_by_status<T: StatusRecord>(rows: &[T], filter: StatusFilter) -> Vec<&T> {
    rows.iter().filter(|row| filter.matches(row.status())).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn users() -> Vec<User> {
        serde_json::from_value(json!([
            {"_id": "u1", "fullName": "An", "status": "active"},
            {"_id": "u2", "fullName": "Binh", "status": "inactive"},
            {"_id": "u3", "fullName": "Chi", "status": "active",
             "address": [
                {"street": "1 Hang Bai", "city": "Hanoi", "isDefault": true},
                {"street": "2 Le Loi", "ward": "", "district": "1", "city": "HCMC"}
             ]}
        ]))
        .unwrap_or_default()
    }

    #[test]
    fn test_optimistic_change_touches_only_selected() {
        let mut users = users();
        let changed = apply_status_change(&mut users, &["u1", "u2"], ActiveStatus::Inactive);
        assert_eq!(changed, 2);
        let statuses: Vec<ActiveStatus> = users.iter().map(|u| u.status).collect();
        assert_eq!(
            statuses,
            [ActiveStatus::Inactive, ActiveStatus::Inactive, ActiveStatus::Active]
        );
    }

    #[test]
    fn test_filter_by_status() {
        let users = users();
        assert_eq!(filter_by_status(&users, StatusFilter::Active).len(), 2);
        assert_eq!(filter_by_status(&users, StatusFilter::All).len(), 3);
    }

    #[test]
    fn test_bulk_requires_selection() {
        assert_eq!(
            BulkStatusChange::new(vec![], ActiveStatus::Active),
            Err(BulkError::NothingSelected)
        );
        assert_eq!(
            BulkStatusChange::new(vec![" ".into()], ActiveStatus::Active),
            Err(BulkError::NothingSelected)
        );
        let body = BulkStatusChange::new(vec!["u1".into()], ActiveStatus::Inactive)
            .map(|b| serde_json::to_value(b).unwrap_or_default());
        assert_eq!(body, Ok(json!({"ids": ["u1"], "key": "status", "value": "inactive"})));
    }

    #[test]
    fn test_password_validation() {
        assert_eq!(validate_password_change("", "x"), Err(PasswordError::Missing));
        assert_eq!(validate_password_change("abc", ""), Err(PasswordError::Missing));
        assert_eq!(validate_password_change("abc", "abd"), Err(PasswordError::Mismatch));
        assert_eq!(validate_password_change("abc", "abc"), Ok("abc"));
    }

    #[test]
    fn test_profile_update_defaults() {
        let update = ProfileUpdate::new("An", "an@mail.vn", "", "", " ", ActiveStatus::Unknown);
        assert_eq!(update.position, "1");
        assert_eq!(update.status, ActiveStatus::Active);
        assert!(update.password.is_empty());

        let body = serde_json::to_value(update.with_password("s3cret".into())).unwrap_or_default();
        assert_eq!(body.get("passWord"), Some(&json!("s3cret")));
        assert_eq!(body.get("fullName"), Some(&json!("An")));
    }

    #[test]
    fn test_address_visibility() {
        let users = users();
        let chi = users.get(2).cloned().unwrap_or_default();
        assert!(chi.has_address_toggle());
        assert_eq!(chi.visible_addresses(false).len(), 1);
        assert_eq!(chi.visible_addresses(true).len(), 2);
        assert_eq!(
            chi.addresses.get(1).map(Address::one_line).as_deref(),
            Some("2 Le Loi, 1, HCMC")
        );
    }
}
