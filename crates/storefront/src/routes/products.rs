//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use hearth_core::catalog::{Category, Listing, Product, find_category};

use crate::backend::PAGE_SIZE;
use crate::error::AppError;
use crate::filters;
use crate::filters::image_url;
use crate::state::AppState;
use crate::views::{Chrome, ProductCardView, category_href};

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
}

impl PaginationQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub color: String,
    pub image: String,
    pub price: String,
    pub list_price: Option<String>,
    pub discount: Option<String>,
    pub stock: i64,
    pub in_stock: bool,
    pub category: Option<CategoryLink>,
}

/// Breadcrumb link to the product's category.
#[derive(Clone)]
pub struct CategoryLink {
    pub name: String,
    pub href: String,
}

impl ProductDetailView {
    fn new(product: &Product, tree: &[Category]) -> Self {
        let card = ProductCardView::from(product);
        let category = product.product_category_id.as_ref().and_then(|id| {
            find_category(tree, id).map(|c| CategoryLink {
                name: c.name.clone(),
                href: category_href(&c.description),
            })
        });
        Self {
            id: card.id,
            title: card.title,
            description: product.description.clone(),
            color: product.color.clone(),
            image: image_url(product.thumbnail.as_deref().unwrap_or_default()),
            price: card.price,
            list_price: card.list_price,
            discount: card.discount,
            stock: product.stock,
            in_stock: card.in_stock,
            category,
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: Chrome,
    pub heading: String,
    pub products: Vec<ProductCardView>,
    pub base_path: String,
    pub current_page: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    pub error: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub chrome: Chrome,
    pub product: ProductDetailView,
    pub related_products: Vec<ProductCardView>,
}

/// All products.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PaginationQuery>,
) -> impl IntoResponse {
    listing(&state, &session, Listing::All, "/products".to_string(), query.page()).await
}

/// Newest products first.
#[instrument(skip(state, session))]
pub async fn new_arrivals(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PaginationQuery>,
) -> impl IntoResponse {
    listing(&state, &session, Listing::New, "/products/new".to_string(), query.page()).await
}

/// Featured products.
#[instrument(skip(state, session))]
pub async fn featured(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PaginationQuery>,
) -> impl IntoResponse {
    listing(
        &state,
        &session,
        Listing::Featured,
        "/products/featured".to_string(),
        query.page(),
    )
    .await
}

/// A category and its direct subcategories.
#[instrument(skip(state, session))]
pub async fn category(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> impl IntoResponse {
    let base_path = category_href(&slug);
    listing(&state, &session, Listing::Category(slug), base_path, query.page()).await
}

async fn listing(
    state: &AppState,
    session: &Session,
    listing: Listing,
    base_path: String,
    page: u32,
) -> ProductsIndexTemplate {
    let chrome = Chrome::load(state, session).await;
    let tree = state.backend().categories().await.unwrap_or_default();

    // Category listings are served by the slug endpoint; the other
    // listings narrow the full catalog locally.
    let slug = match &listing {
        Listing::Category(slug) => Some(slug.as_str()),
        Listing::All | Listing::New | Listing::Featured => None,
    };
    let category_name = slug.and_then(|slug| category_name(&tree, slug));
    let heading = listing.heading(category_name.as_deref()).to_string();

    match state.backend().products(slug, page).await {
        Ok(products) => {
            let full_page = u32::try_from(products.len()).is_ok_and(|n| n >= PAGE_SIZE);
            let products = listing.apply(products, &tree);
            ProductsIndexTemplate {
                chrome,
                heading,
                products: products.iter().map(ProductCardView::from).collect(),
                base_path,
                current_page: page,
                prev_page: (page > 1).then(|| page - 1),
                next_page: full_page.then(|| page + 1),
                error: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to load products");
            ProductsIndexTemplate {
                chrome,
                heading,
                products: Vec::new(),
                base_path,
                current_page: page,
                prev_page: (page > 1).then(|| page - 1),
                next_page: None,
                error: Some(format!("Could not load products. {}", e.user_message())),
            }
        }
    }
}

/// Name of the category whose slug is `slug`, searched through the whole
/// tree.
fn category_name(tree: &[Category], slug: &str) -> Option<String> {
    fn find<'a>(tree: &'a [Category], slug: &str) -> Option<&'a Category> {
        tree.iter()
            .find_map(|c| if c.description == slug { Some(c) } else { find(&c.subcategories, slug) })
    }
    find(tree, slug).map(|c| c.name.clone())
}

/// Display product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let detail = state.backend().product_detail(&slug).await?;
    let tree = state.backend().categories().await.unwrap_or_default();
    let chrome = Chrome::load(&state, &session).await;

    // Related products exclude the product itself.
    let related_products = detail
        .related_products
        .iter()
        .filter(|p| p.id != detail.product.id)
        .map(ProductCardView::from)
        .collect();

    Ok(ProductShowTemplate {
        chrome,
        product: ProductDetailView::new(&detail.product, &tree),
        related_products,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use hearth_core::catalog::flatten_categories;

    use super::*;

    fn tree() -> Vec<Category> {
        serde_json::from_value(json!([
            {"category_id": "c1", "name": "Living room", "description": "living-room",
             "subcategories": [{"category_id": "c2", "name": "Sofas", "description": "sofas"}]}
        ]))
        .unwrap_or_default()
    }

    #[test]
    fn test_category_name_searches_subcategories() {
        assert_eq!(category_name(&tree(), "sofas").as_deref(), Some("Sofas"));
        assert_eq!(category_name(&tree(), "garden"), None);
        assert_eq!(flatten_categories(&tree()).len(), 2);
    }

    #[test]
    fn test_detail_view_links_category() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1", "title": "Linen sofa", "product_category_id": "c2", "price": 9_000_000
        }))
        .unwrap_or_default();
        let view = ProductDetailView::new(&product, &tree());
        assert_eq!(view.category.map(|c| c.href).as_deref(), Some("/products/category/sofas"));
        assert_eq!(view.price, "9.000.000 ₫");
    }
}
