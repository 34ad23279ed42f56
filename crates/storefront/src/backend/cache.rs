//! Cache types for catalog responses.

use hearth_core::catalog::{Category, Product, ProductDetail};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Products { slug: Option<String>, page: u32 },
    Product(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Products(Vec<Product>),
    Product(Box<ProductDetail>),
}
