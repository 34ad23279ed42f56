//! Display data shared by several pages.
//!
//! Handlers convert backend DTOs into these plain views with every amount
//! and label already formatted, so templates never do arithmetic.

use tower_sessions::Session;
use tracing::warn;

use hearth_core::Money;
use hearth_core::catalog::{Category, Product};

use crate::filters::image_url;
use crate::middleware::{session_credentials, take_flash};
use crate::models::{CurrentCustomer, Flash, session_keys};
use crate::state::AppState;

/// A category link in the header bar.
#[derive(Clone)]
pub struct CategoryNav {
    pub name: String,
    pub href: String,
    pub children: Vec<CategoryNav>,
}

impl CategoryNav {
    fn from_category(category: &Category, depth: usize) -> Self {
        Self {
            name: category.name.clone(),
            href: category_href(&category.description),
            // The bar shows top-level categories and their direct children.
            children: if depth == 0 {
                category
                    .subcategories
                    .iter()
                    .map(|sub| Self::from_category(sub, depth + 1))
                    .collect()
            } else {
                Vec::new()
            },
        }
    }
}

/// Link to a category listing.
#[must_use]
pub fn category_href(slug: &str) -> String {
    format!("/products/category/{}", urlencoding::encode(slug))
}

/// Header, category bar and notice banner common to every page.
#[derive(Clone, Default)]
pub struct Chrome {
    pub customer: Option<CurrentCustomer>,
    pub categories: Vec<CategoryNav>,
    /// Distinct cart lines, not summed quantities.
    pub cart_count: usize,
    pub flash: Option<Flash>,
}

impl Chrome {
    /// Gather everything the layout needs.
    ///
    /// The layout must render even when the backend is down, so failures
    /// degrade to an empty category bar and a zero badge.
    pub async fn load(state: &AppState, session: &Session) -> Self {
        let customer = session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten();
        let flash = take_flash(session).await;

        let categories = match state.backend().categories().await {
            Ok(tree) => tree
                .iter()
                .map(|category| CategoryNav::from_category(category, 0))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to load category bar");
                Vec::new()
            }
        };

        let credentials = session_credentials(session).await;
        let cart_count = if credentials.has_cart() {
            state
                .backend()
                .cart(&credentials)
                .await
                .map(|cart| cart.item_count())
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to load cart badge");
                    0
                })
        } else {
            0
        };

        Self {
            customer,
            categories,
            cart_count,
            flash,
        }
    }

    /// Show `flash` on this render instead of the queued one.
    #[must_use]
    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }
}

/// Product tile used by listings, the home page and related products.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub image: String,
    pub price: String,
    /// Struck-through list price when a discount applies.
    pub list_price: Option<String>,
    /// `-15%` style badge.
    pub discount: Option<String>,
    pub in_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let discounted = product.is_discounted();
        Self {
            id: product.id.to_string(),
            slug: product.slug.clone(),
            title: product.title.clone(),
            image: image_url(product.thumbnail.as_deref().unwrap_or_default()),
            price: Money::display_or(product.sale_price(), "Contact us"),
            list_price: product
                .price
                .filter(|_| discounted)
                .map(|p| Money::new(p).to_string()),
            discount: discounted.then(|| format!("-{}%", product.discount_percentage.normalize())),
            in_stock: product.in_stock(),
        }
    }
}
