//! Status enums for catalog entries, accounts and orders.
//!
//! Values are spelled exactly as the backend stores them. Unknown values
//! deserialize into a catch-all variant instead of failing the whole page.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Visibility of a product, category or user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    Active,
    #[default]
    Inactive,
    /// Any value the backend sends that is neither `active` nor `inactive`.
    #[serde(other)]
    Unknown,
}

impl ActiveStatus {
    /// Backend spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Unknown => "unknown",
        }
    }

    /// Status a toggle switches to. Anything not active becomes active.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive | Self::Unknown => Self::Active,
        }
    }

    /// Human label for badges.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ActiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("invalid status: {s}")),
        }
    }
}

/// List filter over [`ActiveStatus`] used by the product and user tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    /// Parse a query parameter; anything unrecognised means `all`.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("active") => Self::Active,
            Some("inactive") => Self::Inactive,
            _ => Self::All,
        }
    }

    /// Query parameter spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Whether an entry with `status` passes this filter.
    #[must_use]
    pub fn matches(self, status: ActiveStatus) -> bool {
        match self {
            Self::All => true,
            Self::Active => status == ActiveStatus::Active,
            Self::Inactive => status == ActiveStatus::Inactive,
        }
    }
}

/// Fulfilment stage recorded in an order's status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Receiving orders")]
    ReceivingOrders,
    #[serde(rename = "Order processing")]
    OrderProcessing,
    #[serde(rename = "Being delivered")]
    BeingDelivered,
    #[serde(rename = "Delivered")]
    Delivered,
    #[serde(rename = "Canceled")]
    Canceled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Every known stage, in fulfilment order.
    pub const ALL: [Self; 5] = [
        Self::ReceivingOrders,
        Self::OrderProcessing,
        Self::BeingDelivered,
        Self::Delivered,
        Self::Canceled,
    ];

    /// Backend spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReceivingOrders => "Receiving orders",
            Self::OrderProcessing => "Order processing",
            Self::BeingDelivered => "Being delivered",
            Self::Delivered => "Delivered",
            Self::Canceled => "Canceled",
            Self::Unknown => "Unknown",
        }
    }

    /// Customer-facing label.
    ///
    /// Unknown stages render as canceled, matching what the back-office has
    /// always shown for them.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ReceivingOrders => "Order placed",
            Self::OrderProcessing => "Packed",
            Self::BeingDelivered => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Canceled | Self::Unknown => "Canceled",
        }
    }

    /// CSS badge modifier.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::ReceivingOrders => "badge-info",
            Self::OrderProcessing => "badge-warning",
            Self::BeingDelivered => "badge-primary",
            Self::Delivered => "badge-success",
            Self::Canceled | Self::Unknown => "badge-error",
        }
    }

    /// Parse a filter query parameter (backend spelling).
    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    #[serde(other)]
    Other,
}

impl PaymentStatus {
    /// Anything other than pending is shown as completed.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid | Self::Other => "Completed",
        }
    }

    /// CSS badge modifier.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Pending => "badge-warning",
            Self::Paid | Self::Other => "badge-success",
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    /// `MoMo` e-wallet; the backend answers with a payment URL.
    Momo,
}

impl PaymentMethod {
    /// Backend spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Momo => "momo",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cod => "Cash on delivery",
            Self::Momo => "MoMo e-wallet",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "momo" => Ok(Self::Momo),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        assert_eq!(ActiveStatus::Active.toggled(), ActiveStatus::Inactive);
        assert_eq!(ActiveStatus::Inactive.toggled(), ActiveStatus::Active);
        assert_eq!(ActiveStatus::Unknown.toggled(), ActiveStatus::Active);
    }

    #[test]
    fn test_unknown_status_deserializes() {
        let status: ActiveStatus = serde_json::from_str("\"archived\"").unwrap_or_default();
        assert_eq!(status, ActiveStatus::Unknown);
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(StatusFilter::from_param(Some("active")), StatusFilter::Active);
        assert_eq!(StatusFilter::from_param(Some("bogus")), StatusFilter::All);
        assert_eq!(StatusFilter::from_param(None), StatusFilter::All);
        assert!(StatusFilter::All.matches(ActiveStatus::Unknown));
        assert!(!StatusFilter::Inactive.matches(ActiveStatus::Unknown));
        assert!(StatusFilter::Active.matches(ActiveStatus::Active));
    }

    #[test]
    fn test_order_status_spelling() {
        let status: OrderStatus =
            serde_json::from_str("\"Being delivered\"").unwrap_or(OrderStatus::Unknown);
        assert_eq!(status, OrderStatus::BeingDelivered);
        assert_eq!(OrderStatus::from_param("Delivered"), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::from_param("all"), None);
    }

    #[test]
    fn test_unknown_order_status_renders_as_canceled() {
        let status: OrderStatus =
            serde_json::from_str("\"Returned\"").unwrap_or(OrderStatus::ReceivingOrders);
        assert_eq!(status, OrderStatus::Unknown);
        assert_eq!(status.label(), "Canceled");
        assert_eq!(status.badge_class(), "badge-error");
    }

    #[test]
    fn test_payment_labels() {
        assert_eq!(PaymentStatus::Pending.label(), "Pending");
        assert_eq!(PaymentStatus::Other.label(), "Completed");
        assert_eq!("momo".parse::<PaymentMethod>(), Ok(PaymentMethod::Momo));
        assert!("card".parse::<PaymentMethod>().is_err());
    }
}
