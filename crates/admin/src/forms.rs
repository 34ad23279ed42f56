//! HTML form bodies and their coercion into backend payloads.
//!
//! Browsers send every field as text. Numeric product fields that are blank
//! or malformed become zero, the `featured` checkbox becomes `"1"`/`"0"`, an
//! empty category parent becomes `null`.

use serde::Deserialize;

use hearth_core::catalog::{
    Category, CategoryPayload, Product, ProductPayload, integer_or_zero, number_or_zero,
};
use hearth_core::{ActiveStatus, CategoryId};

/// Product create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub product_category_id: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(rename = "discountPercentage", default)]
    pub discount_percentage: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub position: String,
    /// Present only when the checkbox is ticked.
    #[serde(default)]
    pub featured: Option<String>,
}

impl ProductForm {
    /// Blank form for a new product, inactive until published.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            status: ActiveStatus::Inactive.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Prefill from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        let payload = ProductPayload::from(product);
        Self {
            title: payload.title,
            description: payload.description,
            product_category_id: payload.product_category_id,
            color: payload.color,
            price: payload.price.normalize().to_string(),
            stock: payload.stock.to_string(),
            discount_percentage: payload.discount_percentage.normalize().to_string(),
            thumbnail: payload.thumbnail,
            status: payload.status.as_str().to_string(),
            position: payload.position.to_string(),
            featured: (payload.featured == "1").then(|| "1".to_string()),
        }
    }

    #[must_use]
    pub fn is_featured(&self) -> bool {
        self.featured
            .as_deref()
            .is_some_and(|v| !v.is_empty() && v != "0")
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ActiveStatus::Active.as_str()
    }

    /// The JSON body for `product/create` or `product/edit/{id}`.
    #[must_use]
    pub fn to_payload(&self) -> ProductPayload {
        ProductPayload {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            product_category_id: self.product_category_id.trim().to_string(),
            color: self.color.trim().to_string(),
            price: number_or_zero(&self.price),
            stock: integer_or_zero(&self.stock),
            discount_percentage: number_or_zero(&self.discount_percentage),
            thumbnail: self.thumbnail.trim().to_string(),
            status: if self.is_active() {
                ActiveStatus::Active
            } else {
                ActiveStatus::Inactive
            },
            position: integer_or_zero(&self.position),
            featured: if self.is_featured() { "1" } else { "0" }.to_string(),
        }
    }
}

/// Category create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub position: String,
}

/// Message shown when a category is submitted without a title.
pub const CATEGORY_TITLE_REQUIRED: &str = "Category title is required.";

impl CategoryForm {
    /// Blank form for a new category, active by default.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            status: ActiveStatus::Active.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Prefill from an existing category.
    #[must_use]
    pub fn from_category(category: &Category) -> Self {
        let payload = CategoryPayload::from(category);
        Self {
            title: payload.title,
            description: payload.description,
            parent_id: payload.parent_id.map(|id| id.to_string()).unwrap_or_default(),
            thumbnail: payload.thumbnail,
            status: payload.status.as_str().to_string(),
            position: payload.position.to_string(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != ActiveStatus::Inactive.as_str()
    }

    /// Chosen parent, `None` for a root category.
    #[must_use]
    pub fn parent(&self) -> Option<CategoryId> {
        let parent = self.parent_id.trim();
        (!parent.is_empty()).then(|| CategoryId::new(parent))
    }

    /// The JSON body for `product-category/create` or `/edit/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`CATEGORY_TITLE_REQUIRED`] when the title is blank.
    pub fn to_payload(&self) -> Result<CategoryPayload, &'static str> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CATEGORY_TITLE_REQUIRED);
        }
        Ok(CategoryPayload {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            parent_id: self.parent(),
            thumbnail: self.thumbnail.trim().to_string(),
            status: if self.is_active() {
                ActiveStatus::Active
            } else {
                ActiveStatus::Inactive
            },
            position: integer_or_zero(&self.position),
        })
    }
}

/// Confirmation step of a single-row action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirm: Option<String>,
    #[serde(default)]
    pub return_to: Option<String>,
}

impl ConfirmForm {
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("yes")
    }
}

/// A bulk status form: repeated `ids` checkboxes plus the target status.
///
/// `axum::Form` cannot collect repeated keys, so the body is read raw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionForm {
    pub ids: Vec<String>,
    pub status: String,
    pub confirmed: bool,
    pub return_to: Option<String>,
}

impl SelectionForm {
    /// Parse an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let mut form = Self::default();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "ids" => form.ids.push(value.into_owned()),
                "status" => form.status = value.into_owned(),
                "confirm" => form.confirmed = value == "yes",
                "return_to" => form.return_to = Some(value.into_owned()),
                _ => {}
            }
        }
        form
    }

    /// Target status; anything but `active`/`inactive` is unknown.
    #[must_use]
    pub fn target(&self) -> ActiveStatus {
        self.status.parse().unwrap_or(ActiveStatus::Unknown)
    }
}

/// Where to go after an action: a local path from the form, or `fallback`.
#[must_use]
pub fn return_path(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_blank_numbers_become_zero() {
        let form = ProductForm {
            title: " Oak chair ".into(),
            price: String::new(),
            stock: "abc".into(),
            discount_percentage: "12.5".into(),
            position: " 3 ".into(),
            ..ProductForm::blank()
        };
        let payload = form.to_payload();
        assert_eq!(payload.title, "Oak chair");
        assert_eq!(payload.price, Decimal::ZERO);
        assert_eq!(payload.stock, 0);
        assert_eq!(payload.discount_percentage, Decimal::new(125, 1));
        assert_eq!(payload.position, 3);
    }

    #[test]
    fn test_featured_checkbox_and_default_status() {
        let unticked = ProductForm::blank().to_payload();
        assert_eq!(unticked.featured, "0");
        assert_eq!(unticked.status, ActiveStatus::Inactive);

        let ticked = ProductForm {
            featured: Some("1".into()),
            status: "active".into(),
            ..ProductForm::blank()
        };
        let payload = ticked.to_payload();
        assert_eq!(payload.featured, "1");
        assert_eq!(payload.status, ActiveStatus::Active);
    }

    #[test]
    fn test_product_form_prefill() {
        let product = Product {
            title: "Teak bench".into(),
            price: Some(Decimal::new(1_250_000, 0)),
            featured: true,
            status: ActiveStatus::Active,
            ..Product::default()
        };
        let form = ProductForm::from_product(&product);
        assert_eq!(form.price, "1250000");
        assert!(form.is_featured());
        assert!(form.is_active());
    }

    #[test]
    fn test_category_title_required_and_empty_parent() {
        assert_eq!(
            CategoryForm::blank().to_payload(),
            Err(CATEGORY_TITLE_REQUIRED)
        );

        let form = CategoryForm {
            title: "Lighting".into(),
            parent_id: "  ".into(),
            position: "x".into(),
            ..CategoryForm::blank()
        };
        let payload = form.to_payload().unwrap_or_default();
        assert_eq!(payload.parent_id, None);
        assert_eq!(payload.position, 0);
        assert_eq!(payload.status, ActiveStatus::Active);

        let child = CategoryForm {
            title: "Lamps".into(),
            parent_id: "c1".into(),
            ..CategoryForm::blank()
        };
        assert_eq!(
            child.to_payload().ok().and_then(|p| p.parent_id),
            Some(CategoryId::new("c1"))
        );
    }

    #[test]
    fn test_selection_form_collects_repeated_ids() {
        let form = SelectionForm::parse("ids=p1&ids=p2&status=inactive&confirm=yes&return_to=%2Fproducts%3Fstatus%3Dactive");
        assert_eq!(form.ids, ["p1", "p2"]);
        assert_eq!(form.target(), ActiveStatus::Inactive);
        assert!(form.confirmed);
        assert_eq!(form.return_to.as_deref(), Some("/products?status=active"));

        let empty = SelectionForm::parse("status=bogus");
        assert!(empty.ids.is_empty());
        assert_eq!(empty.target(), ActiveStatus::Unknown);
    }

    #[test]
    fn test_return_path_is_local() {
        assert_eq!(return_path(Some("/users?status=active"), "/users"), "/users?status=active");
        assert_eq!(return_path(Some("//evil.example"), "/users"), "/users");
        assert_eq!(return_path(Some("https://evil.example"), "/users"), "/users");
        assert_eq!(return_path(None, "/users"), "/users");
    }
}
