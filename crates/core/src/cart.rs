//! The shopping cart as returned by `cart/` and `checkout`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::types::{Money, ProductId};

/// One line of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub image: Option<String>,
    /// Unit price after discount.
    #[serde(rename = "priceNew", default, deserialize_with = "lenient::decimal_or_zero")]
    pub price_new: Decimal,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u32,
    #[serde(rename = "totalPrice", default, deserialize_with = "lenient::decimal_or_zero")]
    pub total_price: Decimal,
}

impl CartItem {
    /// `priceNew * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        Money::new(self.price_new) * self.quantity
    }
}

/// The customer's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, deserialize_with = "lenient::list")]
    pub items: Vec<CartItem>,
    #[serde(rename = "totalPrice", default, deserialize_with = "lenient::decimal_or_zero")]
    pub total_price: Decimal,
}

impl Cart {
    /// An empty cart, used when the backend reports there is none.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines. The header badge shows this, not the
    /// summed quantities.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of line totals computed locally.
    #[must_use]
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total to display: the backend figure when it sent one, otherwise the
    /// local sum.
    #[must_use]
    pub fn display_total(&self) -> Money {
        if self.total_price.is_zero() {
            self.computed_total()
        } else {
            Money::new(self.total_price)
        }
    }

    /// Apply a quantity change locally and refresh the totals.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| &i.product_id == product_id) else {
            return false;
        };
        item.quantity = quantity.max(1);
        // Zero makes `display_total` fall back to the local sum, which shows
        // `N/A` if it overflowed.
        item.total_price = item.line_total().amount().unwrap_or_default();
        self.total_price = self.computed_total().amount().unwrap_or_default();
        true
    }

    /// Drop a line locally and refresh the total.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.items.retain(|i| &i.product_id != product_id);
        self.total_price = self.computed_total().amount().unwrap_or_default();
    }
}

/// Message the backend uses when checkout finds no cart.
pub const EMPTY_CART_MESSAGE: &str = "Cart is empty or not found";

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn cart() -> Cart {
        serde_json::from_value(json!({
            "items": [
                {"product_id": "a", "name": "Chair", "priceNew": "150000", "quantity": 2, "totalPrice": 300000},
                {"product_id": "b", "name": "Lamp", "priceNew": 99000, "quantity": "1", "totalPrice": 99000},
                "garbage"
            ],
            "totalPrice": 399000
        }))
        .unwrap_or_default()
    }

    #[test]
    fn test_parses_lenient_lines() {
        let cart = cart();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.display_total().to_string(), "399.000 ₫");
    }

    #[test]
    fn test_badge_counts_distinct_lines() {
        let mut cart = cart();
        cart.set_quantity(&ProductId::new("a"), 10);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_set_quantity_recomputes_totals() {
        let mut cart = cart();
        assert!(cart.set_quantity(&ProductId::new("a"), 3));
        assert_eq!(cart.total_price, Decimal::from(549_000));
        assert!(!cart.set_quantity(&ProductId::new("zzz"), 3));
    }

    #[test]
    fn test_out_of_range_line_shows_not_available() {
        let mut cart: Cart = serde_json::from_value(json!({
            "items": [
                {"product_id": "a", "priceNew": "79228162514264337593543950335", "quantity": 4_000_000_000_u32},
                {"product_id": "b", "priceNew": 99000, "quantity": 1}
            ]
        }))
        .unwrap_or_default();
        assert_eq!(cart.items.first().map(|i| i.line_total().to_string()), Some("N/A".to_string()));
        assert_eq!(cart.display_total().to_string(), "N/A");

        assert!(cart.set_quantity(&ProductId::new("b"), 2));
        assert_eq!(cart.total_price, Decimal::ZERO);
        assert_eq!(cart.display_total().to_string(), "N/A");
    }

    #[test]
    fn test_quantity_minimum_is_one() {
        let mut cart = cart();
        cart.set_quantity(&ProductId::new("b"), 0);
        assert_eq!(cart.items.get(1).map(|i| i.quantity), Some(1));
    }

    #[test]
    fn test_remove_line() {
        let mut cart = cart();
        cart.remove(&ProductId::new("a"));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.display_total().to_string(), "99.000 ₫");
        cart.remove(&ProductId::new("b"));
        assert!(cart.is_empty());
        assert_eq!(cart.display_total(), Money::ZERO);
    }
}
