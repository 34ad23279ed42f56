//! Orders, their line items and status history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::types::{
    Money, OrderId, OrderLineId, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
    discounted_price,
};

/// Delivery details captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: String,
}

/// A purchased product inside an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "_id", default)]
    pub id: OrderLineId,
    #[serde(default)]
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub price: Decimal,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u32,
    #[serde(rename = "discountPercentage", default, deserialize_with = "lenient::decimal_or_zero")]
    pub discount_percentage: Decimal,
}

impl OrderLine {
    /// Unit price after discount.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        discounted_price(self.price, self.discount_percentage).map_or(Money::OUT_OF_RANGE, Money::new)
    }

    /// Discounted unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusEntry {
    pub status: OrderStatus,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient::or_default")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An order as listed by `my-order` and `order/all-orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", default)]
    pub id: OrderId,
    #[serde(rename = "user_infor", default, deserialize_with = "lenient::or_default")]
    pub recipient: Recipient,
    #[serde(rename = "product", default, deserialize_with = "lenient::list")]
    pub lines: Vec<OrderLine>,
    #[serde(rename = "shippingFee", default, deserialize_with = "lenient::decimal_or_zero")]
    pub shipping_fee: Decimal,
    #[serde(rename = "orderStatus", default, deserialize_with = "lenient::list")]
    pub status_history: Vec<OrderStatusEntry>,
    #[serde(rename = "paymentMethod", default, deserialize_with = "lenient::or_default")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "paymentStatus", default, deserialize_with = "lenient::or_default")]
    pub payment_status: PaymentStatus,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient::or_default")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Sum of the product lines, before shipping.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    /// Display total: discounted lines plus the shipping fee.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.subtotal() + Money::new(self.shipping_fee)
    }

    /// Last entry of the status history, `Receiving orders` when empty.
    #[must_use]
    pub fn latest_status(&self) -> OrderStatus {
        self.status_history
            .last()
            .map_or(OrderStatus::ReceivingOrders, |entry| entry.status)
    }
}

/// Body of `checkout/order`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
}

/// Filter for the back-office order table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderFilter {
    #[default]
    All,
    Latest(OrderStatus),
}

impl OrderFilter {
    /// Parse a query parameter; unknown values mean all orders.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        value
            .and_then(OrderStatus::from_param)
            .map_or(Self::All, Self::Latest)
    }

    /// Query parameter spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Latest(status) => status.as_str(),
        }
    }

    #[must_use]
    pub fn matches(self, order: &Order) -> bool {
        match self {
            Self::All => true,
            Self::Latest(status) => order.latest_status() == status,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order() -> Order {
        serde_json::from_value(json!({
            "_id": "665f1c2ab7e4a10012345678",
            "user_infor": {"name": "An", "email": "an@mail.vn", "phone": "0901", "address": "Hanoi"},
            "product": [
                {"_id": "l1", "product_id": "p1", "price": 200000, "quantity": 2, "discountPercentage": 10},
                {"_id": "l2", "product_id": "p2", "price": "50000", "quantity": "1"}
            ],
            "shippingFee": 30000,
            "orderStatus": [
                {"status": "Receiving orders", "updatedAt": "2026-01-02T03:04:05Z"},
                {"status": "Being delivered", "updatedAt": "2026-01-03T03:04:05Z"}
            ],
            "paymentMethod": "momo",
            "paymentStatus": "paid",
            "createdAt": "2026-01-02T03:04:05Z"
        }))
        .unwrap_or_default()
    }

    #[test]
    fn test_total_includes_discount_and_shipping() {
        // 200000 * 0.9 * 2 + 50000 + 30000
        assert_eq!(order().total_price().to_string(), "440.000 ₫");
        assert_eq!(order().subtotal().to_string(), "410.000 ₫");
    }

    #[test]
    fn test_missing_numbers_count_as_zero() {
        let order: Order = serde_json::from_value(json!({
            "_id": "o1",
            "product": [{"price": null, "quantity": "x"}],
            "shippingFee": "free"
        }))
        .unwrap_or_default();
        assert_eq!(order.total_price(), Money::ZERO);
    }

    #[test]
    fn test_out_of_range_total_shows_not_available() {
        let order: Order = serde_json::from_value(json!({
            "_id": "o2",
            "product": [{"product_id": "p1", "price": "79228162514264337593543950335", "quantity": 2}],
            "shippingFee": 30000
        }))
        .unwrap_or_default();
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.subtotal().to_string(), "N/A");
        assert_eq!(order.total_price().to_string(), "N/A");
    }

    #[test]
    fn test_latest_status() {
        assert_eq!(order().latest_status(), OrderStatus::BeingDelivered);
        let empty = Order::default();
        assert_eq!(empty.latest_status(), OrderStatus::ReceivingOrders);
    }

    #[test]
    fn test_lenient_header_fields() {
        let order = order();
        assert_eq!(order.payment_method, PaymentMethod::Momo);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.recipient.name, "An");
        assert_eq!(order.id.short(), "345678");
    }

    #[test]
    fn test_order_filter() {
        let order = order();
        assert!(OrderFilter::from_param(Some("Being delivered")).matches(&order));
        assert!(!OrderFilter::from_param(Some("Delivered")).matches(&order));
        assert!(OrderFilter::from_param(Some("all")).matches(&order));
        assert_eq!(OrderFilter::from_param(None), OrderFilter::All);
    }

    #[test]
    fn test_order_request_body() {
        let body = serde_json::to_value(OrderRequest {
            payment_method: PaymentMethod::Momo,
            ..OrderRequest::default()
        })
        .unwrap_or_default();
        assert_eq!(body.get("paymentMethod"), Some(&json!("momo")));
    }
}
