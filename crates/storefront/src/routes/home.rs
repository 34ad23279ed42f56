//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::catalog::{Listing, Product};

use crate::filters;
use crate::state::AppState;
use crate::views::{Chrome, ProductCardView};

/// Tiles shown per home page section.
const PRODUCTS_PER_SECTION: usize = 8;

/// Promotional banner above the product sections.
#[derive(Clone)]
pub struct Banner {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub button_text: &'static str,
    pub button_url: &'static str,
    /// Stylesheet class carrying the background image.
    pub css_class: &'static str,
}

const BANNERS: [Banner; 2] = [
    Banner {
        title: "Made for slow mornings",
        subtitle: "Solid wood tables and chairs for the heart of the home.",
        button_text: "Shop new arrivals",
        button_url: "/products/new",
        css_class: "banner-dining",
    },
    Banner {
        title: "Rest easy",
        subtitle: "Sofas and beds picked by our stylists.",
        button_text: "See featured pieces",
        button_url: "/products/featured",
        css_class: "banner-living",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
    pub banners: Vec<Banner>,
    pub featured_products: Vec<ProductCardView>,
    pub latest_products: Vec<ProductCardView>,
    pub error: Option<String>,
}

/// Featured and latest sections built from a single page of products.
fn sections(products: Vec<Product>) -> (Vec<ProductCardView>, Vec<ProductCardView>) {
    let featured = Listing::Featured
        .apply(products.clone(), &[])
        .iter()
        .take(PRODUCTS_PER_SECTION)
        .map(ProductCardView::from)
        .collect();
    let latest = Listing::New
        .apply(products, &[])
        .iter()
        .take(PRODUCTS_PER_SECTION)
        .map(ProductCardView::from)
        .collect();
    (featured, latest)
}

/// Display the home page.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let chrome = Chrome::load(&state, &session).await;

    let (featured_products, latest_products, error) =
        match state.backend().products(None, 1).await {
            Ok(products) => {
                let (featured, latest) = sections(products);
                (featured, latest, None)
            }
            Err(e) => {
                tracing::error!("Failed to fetch home page products: {e}");
                (Vec::new(), Vec::new(), Some(e.user_message()))
            }
        };

    HomeTemplate {
        chrome,
        banners: BANNERS.to_vec(),
        featured_products,
        latest_products,
        error,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_sections_split_one_page() {
        let products: Vec<Product> = serde_json::from_value(json!([
            {"_id": "a", "title": "Old stool", "createdAt": "2024-01-01T00:00:00Z", "featured": "1"},
            {"_id": "b", "title": "New desk", "createdAt": "2025-03-01T00:00:00Z"},
            {"_id": "c", "title": "Armchair", "createdAt": "2024-06-01T00:00:00Z", "featured": "1"}
        ]))
        .unwrap_or_default();

        let (featured, latest) = sections(products);
        let titles = |views: &[ProductCardView]| views.iter().map(|v| v.title.clone()).collect::<Vec<_>>();
        assert_eq!(titles(&featured), ["Old stool", "Armchair"]);
        assert_eq!(titles(&latest), ["New desk", "Armchair", "Old stool"]);
    }
}
