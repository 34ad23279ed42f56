//! Product management route handlers.
//!
//! The table is served from the session's list snapshot. Status changes and
//! deletes go through a confirmation page first; a confirmed status change
//! is written into the snapshot, a delete drops it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::account::BulkStatusChange;
use hearth_core::api::Credentials;
use hearth_core::catalog::{
    Category, Product, category_names, filter_products, flatten_categories,
};
use hearth_core::{CategoryId, Money, ProductId, StatusFilter};

use crate::error::AppError;
use crate::filters;
use crate::filters::image_url;
use crate::forms::{ConfirmForm, ProductForm, SelectionForm, return_path};
use crate::middleware::{RequireAdminAuth, push_flash};
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;
use crate::views::{Choice, ConfirmTemplate, HiddenField, Layout, status_badge};

const LIST_PATH: &str = "/products";

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index))
        .route("/products/new", get(new_form).post(create))
        .route("/products/bulk-status", post(bulk_status))
        .route("/products/{id}/edit", get(edit_form).post(update))
        .route("/products/{id}/status", post(change_status))
        .route("/products/{id}/delete", post(delete))
}

/// Table filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilterQuery {
    pub category: Option<String>,
    pub status: Option<String>,
}

impl ProductFilterQuery {
    fn category(&self) -> Option<CategoryId> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(CategoryId::new)
    }

    fn status(&self) -> StatusFilter {
        StatusFilter::from_param(self.status.as_deref())
    }

    /// The list URL with these filters applied.
    fn list_href(&self) -> String {
        let category = self.category().map(|c| c.to_string()).unwrap_or_default();
        format!(
            "{LIST_PATH}?category={}&status={}",
            urlencoding::encode(&category),
            self.status().as_str()
        )
    }
}

/// Product row for templates.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub title: String,
    pub image: String,
    pub category: String,
    pub price: String,
    /// Discounted price, when a discount applies.
    pub sale_price: Option<String>,
    pub stock: i64,
    pub position: i64,
    pub featured: bool,
    pub status: String,
    pub status_class: String,
    pub toggle_label: String,
}

impl ProductRowView {
    fn new(product: &Product, category: Option<&String>) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            image: image_url(product.thumbnail.as_deref()),
            category: category.cloned().unwrap_or_else(|| "-".to_string()),
            price: Money::display_or(product.price, "-"),
            sale_price: product
                .is_discounted()
                .then(|| Money::display_or(product.sale_price(), "-")),
            stock: product.stock,
            position: product.position,
            featured: product.featured,
            status: product.status.label().to_string(),
            status_class: status_badge(product.status).to_string(),
            toggle_label: format!("Set {}", product.status.toggled().label().to_lowercase()),
        }
    }
}

/// Products list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRowView>,
    pub categories: Vec<Choice>,
    pub statuses: Vec<Choice>,
    pub return_to: String,
    pub error: Option<String>,
}

/// Product create/edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub heading: String,
    pub action: String,
    pub form: ProductForm,
    pub categories: Vec<Choice>,
    pub statuses: Vec<Choice>,
    pub error: Option<String>,
}

/// Category tree for selects and labels. A failure leaves them empty.
async fn load_categories(state: &AppState, auth: &Credentials) -> Vec<Category> {
    state.backend().categories(auth).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load categories");
        Vec::new()
    })
}

/// Products list page handler.
///
/// GET /products
#[instrument(skip(admin, auth, state, session))]
async fn index(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ProductFilterQuery>,
) -> impl IntoResponse {
    let layout = Layout::load(&admin, &session, LIST_PATH).await;
    let tree = load_categories(&state, &auth).await;
    let names = category_names(&tree);
    let category = query.category();

    let (products, error) = match state.backend().products(&admin.cache_scope, &auth).await {
        Ok(products) => {
            let rows = filter_products(&products, category.as_ref(), query.status())
                .into_iter()
                .map(|p| {
                    ProductRowView::new(p, p.product_category_id.as_ref().and_then(|c| names.get(c)))
                })
                .collect();
            (rows, None)
        }
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };

    let selected = category.map(|c| c.to_string()).unwrap_or_default();
    ProductsIndexTemplate {
        layout,
        products,
        categories: Choice::categories(&flatten_categories(&tree), &selected),
        statuses: Choice::status_filters(query.status()),
        return_to: query.list_href(),
        error,
    }
}

async fn render_form(
    state: &AppState,
    admin: &CurrentAdmin,
    auth: &Credentials,
    session: &Session,
    product_id: Option<&ProductId>,
    form: ProductForm,
    error: Option<String>,
) -> ProductFormTemplate {
    let tree = load_categories(state, auth).await;
    let (heading, action, current_path) = match product_id {
        Some(id) => (
            "Edit product".to_string(),
            format!("{LIST_PATH}/{id}/edit"),
            format!("{LIST_PATH}/{id}/edit"),
        ),
        None => (
            "New product".to_string(),
            format!("{LIST_PATH}/new"),
            format!("{LIST_PATH}/new"),
        ),
    };
    ProductFormTemplate {
        layout: Layout::load(admin, session, &current_path).await,
        heading,
        action,
        categories: Choice::categories(&flatten_categories(&tree), &form.product_category_id),
        statuses: Choice::statuses(&form.status),
        form,
        error,
    }
}

/// New product form.
///
/// GET /products/new
#[instrument(skip(admin, auth, state, session))]
async fn new_form(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    render_form(&state, &admin, &auth, &session, None, ProductForm::blank(), None).await
}

/// Create a product.
///
/// POST /products/new
#[instrument(skip(admin, auth, state, session, form))]
async fn create(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Response {
    let payload = form.to_payload();
    match state
        .backend()
        .create_product(&admin.cache_scope, &auth, &payload)
        .await
    {
        Ok(message) => {
            tracing::info!(title = %payload.title, "Product created");
            push_flash(
                &session,
                Flash::success(message.unwrap_or_else(|| "Product created.".to_string())),
            )
            .await;
            Redirect::to(LIST_PATH).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to create product: {e}");
            render_form(&state, &admin, &auth, &session, None, form, Some(e.user_message()))
                .await
                .into_response()
        }
    }
}

/// Edit product form.
///
/// GET /products/{id}/edit
#[instrument(skip(admin, auth, state, session))]
async fn edit_form(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);
    let product = state.backend().product(&auth, &id).await?;
    let form = ProductForm::from_product(&product);
    Ok(render_form(&state, &admin, &auth, &session, Some(&id), form, None)
        .await
        .into_response())
}

/// Save an edited product.
///
/// POST /products/{id}/edit
#[instrument(skip(admin, auth, state, session, form))]
async fn update(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Response {
    let id = ProductId::new(id);
    let payload = form.to_payload();
    match state
        .backend()
        .update_product(&admin.cache_scope, &auth, &id, &payload)
        .await
    {
        Ok(message) => {
            tracing::info!(product_id = %id, "Product updated");
            push_flash(
                &session,
                Flash::success(message.unwrap_or_else(|| "Product saved.".to_string())),
            )
            .await;
            Redirect::to(LIST_PATH).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to update product: {e}");
            render_form(&state, &admin, &auth, &session, Some(&id), form, Some(e.user_message()))
                .await
                .into_response()
        }
    }
}

/// Look up a row of the cached table.
async fn find_product(
    state: &AppState,
    admin: &CurrentAdmin,
    auth: &Credentials,
    id: &ProductId,
) -> Result<Product, AppError> {
    state
        .backend()
        .products(&admin.cache_scope, auth)
        .await?
        .into_iter()
        .find(|p| &p.id == id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Toggle a product between active and inactive, after confirmation.
///
/// POST /products/{id}/status
#[instrument(skip(admin, auth, state, session, form))]
async fn change_status(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);
    let product = find_product(&state, &admin, &auth, &id).await?;
    let target = product.status.toggled();
    let back = return_path(form.return_to.as_deref(), LIST_PATH);

    if !form.is_confirmed() {
        return Ok(ConfirmTemplate {
            layout: Layout::load(&admin, &session, LIST_PATH).await,
            title: "Change product status".to_string(),
            message: format!(
                "Change the status of \"{}\" to {}?",
                product.title,
                target.label().to_lowercase()
            ),
            action: format!("{LIST_PATH}/{id}/status"),
            fields: vec![HiddenField::new("return_to", back.clone())],
            cancel_href: back,
            danger: false,
        }
        .into_response());
    }

    let flash = match state
        .backend()
        .change_product_status(&admin.cache_scope, &auth, &id, target)
        .await
    {
        Ok(()) => Flash::success(format!("\"{}\" is now {}.", product.title, target.label().to_lowercase())),
        Err(e) => {
            tracing::warn!("Failed to change product status: {e}");
            Flash::error(e.user_message())
        }
    };
    push_flash(&session, flash).await;
    Ok(Redirect::to(&back).into_response())
}

/// Soft-delete a product, after confirmation.
///
/// POST /products/{id}/delete
#[instrument(skip(admin, auth, state, session, form))]
async fn delete(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);
    let product = find_product(&state, &admin, &auth, &id).await?;
    let back = return_path(form.return_to.as_deref(), LIST_PATH);

    if !form.is_confirmed() {
        return Ok(ConfirmTemplate {
            layout: Layout::load(&admin, &session, LIST_PATH).await,
            title: "Delete product".to_string(),
            message: format!(
                "Delete \"{}\"? It will no longer appear in the shop.",
                product.title
            ),
            action: format!("{LIST_PATH}/{id}/delete"),
            fields: vec![HiddenField::new("return_to", back.clone())],
            cancel_href: back,
            danger: true,
        }
        .into_response());
    }

    let flash = match state
        .backend()
        .delete_product(&admin.cache_scope, &auth, &id)
        .await
    {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            Flash::success(format!("\"{}\" was deleted.", product.title))
        }
        Err(e) => {
            tracing::warn!("Failed to delete product: {e}");
            Flash::error(e.user_message())
        }
    };
    push_flash(&session, flash).await;
    Ok(Redirect::to(&back).into_response())
}

/// Set the status of the ticked products, after confirmation.
///
/// POST /products/bulk-status
#[instrument(skip(admin, auth, state, session, body))]
async fn bulk_status(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    body: String,
) -> Response {
    let form = SelectionForm::parse(&body);
    let back = return_path(form.return_to.as_deref(), LIST_PATH);

    let change = match BulkStatusChange::new(form.ids.clone(), form.target()) {
        Ok(change) => change,
        Err(e) => {
            push_flash(&session, Flash::error(e.to_string())).await;
            return Redirect::to(&back).into_response();
        }
    };

    if !form.confirmed {
        let mut fields: Vec<HiddenField> = change
            .ids
            .iter()
            .map(|id| HiddenField::new("ids", id.clone()))
            .collect();
        fields.push(HiddenField::new("status", change.value.as_str()));
        fields.push(HiddenField::new("return_to", back.clone()));
        return ConfirmTemplate {
            layout: Layout::load(&admin, &session, LIST_PATH).await,
            title: "Change product status".to_string(),
            message: format!(
                "Set {} selected product(s) to {}?",
                change.ids.len(),
                change.value.label().to_lowercase()
            ),
            action: format!("{LIST_PATH}/bulk-status"),
            fields,
            cancel_href: back,
            danger: false,
        }
        .into_response();
    }

    let flash = match state
        .backend()
        .change_products_status(&admin.cache_scope, &auth, &change)
        .await
    {
        Ok(()) => Flash::success(format!(
            "{} product(s) set to {}.",
            change.ids.len(),
            change.value.label().to_lowercase()
        )),
        Err(e) => {
            tracing::warn!("Failed to change product statuses: {e}");
            Flash::error(e.user_message())
        }
    };
    push_flash(&session, flash).await;
    Redirect::to(&back).into_response()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use hearth_core::ActiveStatus;

    use super::*;

    #[test]
    fn test_filter_query_href() {
        let query = ProductFilterQuery {
            category: Some("living room".into()),
            status: Some("inactive".into()),
        };
        assert_eq!(query.list_href(), "/products?category=living%20room&status=inactive");

        let empty = ProductFilterQuery::default();
        assert_eq!(empty.category(), None);
        assert_eq!(empty.list_href(), "/products?category=&status=all");
    }

    #[test]
    fn test_product_row_view() {
        let product = Product {
            id: ProductId::new("p1"),
            title: "Oak chair".into(),
            price: Some(Decimal::from(2_000_000)),
            discount_percentage: Decimal::from(10),
            status: ActiveStatus::Active,
            ..Product::default()
        };
        let row = ProductRowView::new(&product, Some(&"Living room > Chairs".to_string()));
        assert_eq!(row.price, "2.000.000 ₫");
        assert_eq!(row.sale_price.as_deref(), Some("1.800.000 ₫"));
        assert_eq!(row.category, "Living room > Chairs");
        assert_eq!(row.toggle_label, "Set inactive");
        assert_eq!(row.status_class, "badge-success");
    }
}
