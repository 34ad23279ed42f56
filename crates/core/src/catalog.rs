//! Products and the category tree.
//!
//! Categories form a rooted tree of arbitrary branching factor. Select boxes
//! need it flat: [`flatten_categories`] walks the tree depth-first and labels
//! every child with its parent's name (`"Living room > Sofas"`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient;
use crate::types::{ActiveStatus, CategoryId, ProductId, StatusFilter, discounted_price};

/// A product as listed by the catalog and admin endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", default)]
    pub id: ProductId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub slug: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub product_category_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub color: String,
    /// List price. `None` when the backend sent something unparseable.
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub price: Option<Decimal>,
    /// Discounted price when the backend precomputed it.
    #[serde(rename = "priceNew", default, deserialize_with = "lenient::opt_decimal")]
    pub price_new: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::int_or_zero")]
    pub stock: i64,
    #[serde(rename = "discountPercentage", default, deserialize_with = "lenient::decimal_or_zero")]
    pub discount_percentage: Decimal,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: ActiveStatus,
    #[serde(default, deserialize_with = "lenient::int_or_zero")]
    pub position: i64,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub featured: bool,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient::or_default")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Price the customer pays per unit.
    #[must_use]
    pub fn sale_price(&self) -> Option<Decimal> {
        self.price_new
            .or_else(|| self.price.and_then(|p| discounted_price(p, self.discount_percentage)))
    }

    /// Whether a discount applies.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discount_percentage > Decimal::ZERO
    }

    /// Whether the product can be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Product detail page payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    #[serde(rename = "relatedProducts", default, deserialize_with = "lenient::list")]
    pub related_products: Vec<Product>,
}

/// Which products a storefront listing shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    All,
    /// Newest first.
    New,
    /// Only products flagged as featured.
    Featured,
    /// A category (matched by its `description` slug) and its direct subcategories.
    Category(String),
}

impl Listing {
    /// Page heading.
    #[must_use]
    pub fn heading<'a>(&'a self, category_name: Option<&'a str>) -> &'a str {
        match self {
            Self::All => "All products",
            Self::New => "New products",
            Self::Featured => "Featured products",
            Self::Category(slug) => category_name.unwrap_or(slug),
        }
    }

    /// Narrow a page of products fetched from the backend.
    ///
    /// For category listings the backend already filters by slug; the tree
    /// scope is applied on top so subcategory products are kept and strays
    /// dropped. An unknown category leaves the page untouched.
    #[must_use]
    pub fn apply(&self, mut products: Vec<Product>, tree: &[Category]) -> Vec<Product> {
        match self {
            Self::All => products,
            Self::New => {
                products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                products
            }
            Self::Featured => products.into_iter().filter(|p| p.featured).collect(),
            Self::Category(slug) => match category_scope(tree, slug) {
                Some(ids) => products
                    .into_iter()
                    .filter(|p| {
                        p.product_category_id
                            .as_ref()
                            .is_some_and(|id| ids.contains(id))
                    })
                    .collect(),
                None => products,
            },
        }
    }
}

/// A node of the category tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "_id", alias = "id", default)]
    pub category_id: CategoryId,
    #[serde(alias = "title", default, deserialize_with = "lenient::string")]
    pub name: String,
    /// URL slug used by storefront category listings.
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: ActiveStatus,
    #[serde(alias = "index", default, deserialize_with = "lenient::int_or_zero")]
    pub position: i64,
    #[serde(alias = "parentId", default, deserialize_with = "lenient::opt_id")]
    pub parent_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub subcategories: Vec<Category>,
}

/// One entry of a flattened category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub id: CategoryId,
    /// Name prefixed with the parent's name for children.
    pub name: String,
    /// Nesting level, 0 for roots.
    pub depth: usize,
}

/// Read a category tree from a loosely shaped JSON value.
///
/// Accepts a bare array or an object whose `data` field is an array. Anything
/// else is not a tree and yields an empty list.
#[must_use]
pub fn categories_from_value(value: &Value) -> Vec<Category> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

/// Flatten a category tree in depth-first pre-order.
///
/// A child is labelled `"<parent name> > <child name>"` using the immediate
/// parent's own name, so a grandchild reads `"Sofas > Corner sofas"`.
#[must_use]
pub fn flatten_categories(tree: &[Category]) -> Vec<CategoryOption> {
    let mut flat = Vec::new();
    for root in tree {
        push_flattened(root, None, 0, None, &mut flat);
    }
    flat
}

/// Flattened options for a category's parent select.
///
/// The category being edited and its whole subtree are left out so a
/// category can never become its own ancestor.
#[must_use]
pub fn parent_candidates(tree: &[Category], editing: Option<&CategoryId>) -> Vec<CategoryOption> {
    let mut flat = Vec::new();
    for root in tree {
        push_flattened(root, None, 0, editing, &mut flat);
    }
    flat
}

fn push_flattened(
    category: &Category,
    parent_name: Option<&str>,
    depth: usize,
    skip: Option<&CategoryId>,
    out: &mut Vec<CategoryOption>,
) {
    if skip == Some(&category.category_id) {
        return;
    }

    let name = match parent_name {
        Some(parent) => format!("{parent} > {}", category.name),
        None => category.name.clone(),
    };
    out.push(CategoryOption {
        id: category.category_id.clone(),
        name,
        depth,
    });

    for sub in &category.subcategories {
        push_flattened(sub, Some(&category.name), depth + 1, skip, out);
    }
}

/// Ids covered by a top-level category listing: the category whose
/// `description` equals `slug` plus its direct subcategories.
#[must_use]
pub fn category_scope(tree: &[Category], slug: &str) -> Option<Vec<CategoryId>> {
    let category = tree.iter().find(|c| c.description == slug)?;
    let mut ids = Vec::with_capacity(category.subcategories.len() + 1);
    ids.push(category.category_id.clone());
    ids.extend(category.subcategories.iter().map(|s| s.category_id.clone()));
    Some(ids)
}

/// Find a category anywhere in the tree.
#[must_use]
pub fn find_category<'a>(tree: &'a [Category], id: &CategoryId) -> Option<&'a Category> {
    tree.iter().find_map(|c| {
        if &c.category_id == id {
            Some(c)
        } else {
            find_category(&c.subcategories, id)
        }
    })
}

/// Flattened display names keyed by id, for labelling table rows.
#[must_use]
pub fn category_names(tree: &[Category]) -> HashMap<CategoryId, String> {
    flatten_categories(tree)
        .into_iter()
        .map(|opt| (opt.id, opt.name))
        .collect()
}

/// Back-office product table filter: optional category and a status filter.
#[must_use]
pub fn filter_products<'a>(
    products: &'a [Product],
    category: Option<&CategoryId>,
    status: StatusFilter,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| category.is_none_or(|c| p.product_category_id.as_ref() == Some(c)))
        .filter(|p| status.matches(p.status))
        .collect()
}

/// Body of `product/create` and `product/edit/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPayload {
    pub title: String,
    pub description: String,
    pub product_category_id: String,
    pub color: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i64,
    #[serde(rename = "discountPercentage", with = "rust_decimal::serde::float")]
    pub discount_percentage: Decimal,
    pub thumbnail: String,
    pub status: ActiveStatus,
    pub position: i64,
    /// `"1"` when featured, `"0"` otherwise.
    pub featured: String,
}

impl Default for ProductPayload {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            product_category_id: String::new(),
            color: String::new(),
            price: Decimal::ZERO,
            stock: 0,
            discount_percentage: Decimal::ZERO,
            thumbnail: String::new(),
            status: ActiveStatus::Inactive,
            position: 0,
            featured: "0".to_string(),
        }
    }
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            product_category_id: product
                .product_category_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            color: product.color.clone(),
            price: product.price.unwrap_or_default(),
            stock: product.stock,
            discount_percentage: product.discount_percentage,
            thumbnail: product.thumbnail.clone().unwrap_or_default(),
            status: match product.status {
                ActiveStatus::Unknown => ActiveStatus::Inactive,
                other => other,
            },
            position: product.position,
            featured: if product.featured { "1" } else { "0" }.to_string(),
        }
    }
}

/// Body of `product-category/create` and `product-category/edit/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPayload {
    pub title: String,
    pub description: String,
    /// `null` for a root category.
    pub parent_id: Option<CategoryId>,
    pub thumbnail: String,
    pub status: ActiveStatus,
    pub position: i64,
}

impl Default for CategoryPayload {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            parent_id: None,
            thumbnail: String::new(),
            status: ActiveStatus::Active,
            position: 0,
        }
    }
}

impl From<&Category> for CategoryPayload {
    fn from(category: &Category) -> Self {
        Self {
            title: category.name.clone(),
            description: category.description.clone(),
            parent_id: category.parent_id.clone(),
            thumbnail: category.thumbnail.clone().unwrap_or_default(),
            status: category.status,
            position: category.position,
        }
    }
}

/// Parse a numeric form field. Blank or malformed input is zero.
#[must_use]
pub fn number_or_zero(input: &str) -> Decimal {
    input.trim().parse().unwrap_or_default()
}

/// Parse an integer form field. Blank or malformed input is zero.
#[must_use]
pub fn integer_or_zero(input: &str) -> i64 {
    input.trim().parse().unwrap_or_default()
}
