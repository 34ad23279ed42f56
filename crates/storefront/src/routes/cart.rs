//! Cart route handlers.
//!
//! The backend owns the cart; it is addressed by the `cartId` cookie or the
//! login token kept in the session. Mutations redirect back to a page
//! (post/redirect/get) with a flash message describing the outcome.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::ProductId;
use hearth_core::api::Credentials;
use hearth_core::cart::{Cart, CartItem};

use crate::error::add_breadcrumb;
use crate::filters;
use crate::filters::image_url;
use crate::middleware::{push_flash, session_credentials};
use crate::models::Flash;
use crate::state::AppState;
use crate::views::Chrome;

/// Shown when a visitor has neither a login nor a cart cookie.
pub const LOGIN_REQUIRED_MESSAGE: &str = "You must log in first";

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            image: image_url(item.image.as_deref().unwrap_or_default()),
            unit_price: hearth_core::Money::new(item.price_new).to_string(),
            quantity: item.quantity,
            line_total: item.line_total().to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone, Default)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.iter().map(CartItemView::from).collect(),
            total: cart.display_total().to_string(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub quantity: Option<String>,
    /// Page to come back to; only local paths are honoured.
    pub return_to: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub quantity: Option<String>,
}

/// Quantity typed into a form. Blank or unreadable input counts as one and
/// anything below one is raised to one.
fn form_quantity(raw: Option<&str>) -> u32 {
    raw.and_then(|q| q.trim().parse::<i64>().ok())
        .map_or(1, |q| u32::try_from(q.max(1)).unwrap_or(u32::MAX))
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub chrome: Chrome,
    pub cart: CartView,
    pub can_checkout: bool,
    pub error: Option<String>,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: usize,
}

/// Whether the backend can find a cart for these credentials.
const fn has_cart_access(credentials: &Credentials) -> bool {
    credentials.is_authenticated() || credentials.has_cart()
}

/// Local redirect target, falling back to the cart page.
fn return_path(return_to: Option<&str>) -> &str {
    match return_to {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/cart",
    }
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let chrome = Chrome::load(&state, &session).await;
    let credentials = session_credentials(&session).await;

    if !has_cart_access(&credentials) {
        return CartShowTemplate {
            chrome,
            cart: CartView::default(),
            can_checkout: false,
            error: Some(LOGIN_REQUIRED_MESSAGE.to_string()),
        };
    }

    match state.backend().cart(&credentials).await {
        Ok(cart) => CartShowTemplate {
            chrome,
            can_checkout: !cart.is_empty(),
            cart: CartView::from(&cart),
            error: None,
        },
        Err(e) => {
            tracing::warn!("Failed to fetch cart: {e}");
            CartShowTemplate {
                chrome,
                cart: CartView::default(),
                can_checkout: false,
                error: Some(e.user_message()),
            }
        }
    }
}

/// Add a product to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let credentials = session_credentials(&session).await;
    if !has_cart_access(&credentials) {
        push_flash(&session, Flash::error(LOGIN_REQUIRED_MESSAGE)).await;
        return Redirect::to("/auth/login").into_response();
    }

    let quantity = form_quantity(form.quantity.as_deref());
    let back = return_path(form.return_to.as_deref()).to_owned();

    match state
        .backend()
        .add_to_cart(&credentials, &product_id, quantity)
        .await
    {
        Ok(()) => {
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
            push_flash(&session, Flash::success("Added to cart")).await;
        }
        Err(e) => {
            tracing::error!("Failed to add item to cart: {e}");
            push_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to(&back).into_response()
}

/// Set a line's quantity. Quantities below one are raised to one; removing
/// a line is a separate action.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let credentials = session_credentials(&session).await;
    if !has_cart_access(&credentials) {
        push_flash(&session, Flash::error(LOGIN_REQUIRED_MESSAGE)).await;
        return Redirect::to("/auth/login").into_response();
    }

    if let Err(e) = state
        .backend()
        .update_cart_item(&credentials, &product_id, form_quantity(form.quantity.as_deref()))
        .await
    {
        tracing::error!("Failed to update cart: {e}");
        push_flash(&session, Flash::error(e.user_message())).await;
    }

    Redirect::to("/cart").into_response()
}

/// Remove a line from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Response {
    let credentials = session_credentials(&session).await;
    if !has_cart_access(&credentials) {
        push_flash(&session, Flash::error(LOGIN_REQUIRED_MESSAGE)).await;
        return Redirect::to("/auth/login").into_response();
    }

    match state
        .backend()
        .remove_cart_item(&credentials, &product_id)
        .await
    {
        Ok(()) => push_flash(&session, Flash::success("Removed from cart")).await,
        Err(e) => {
            tracing::error!("Failed to remove from cart: {e}");
            push_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/cart").into_response()
}

/// Cart count badge.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let credentials = session_credentials(&session).await;
    let count = if has_cart_access(&credentials) {
        state
            .backend()
            .cart(&credentials)
            .await
            .map(|cart| cart.item_count())
            .unwrap_or(0)
    } else {
        0
    };

    CartCountTemplate { count }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_return_path_only_local() {
        assert_eq!(return_path(Some("/products/oak-chair")), "/products/oak-chair");
        assert_eq!(return_path(Some("//evil.example")), "/cart");
        assert_eq!(return_path(Some("https://evil.example")), "/cart");
        assert_eq!(return_path(None), "/cart");
    }

    #[test]
    fn test_form_quantity_is_lenient() {
        assert_eq!(form_quantity(Some("3")), 3);
        assert_eq!(form_quantity(Some(" 7 ")), 7);
        assert_eq!(form_quantity(Some("0")), 1);
        assert_eq!(form_quantity(Some("-4")), 1);
        assert_eq!(form_quantity(Some("")), 1);
        assert_eq!(form_quantity(Some("two")), 1);
        assert_eq!(form_quantity(None), 1);
        assert_eq!(form_quantity(Some("99999999999")), u32::MAX);
    }

    #[test]
    fn test_cart_access() {
        assert!(!has_cart_access(&Credentials::anonymous()));
        assert!(has_cart_access(&Credentials {
            token: None,
            cart_id: Some("c1".into()),
        }));
    }

    #[test]
    fn test_cart_view_totals() {
        let cart = Cart {
            items: vec![
                CartItem {
                    product_id: ProductId::new("p1"),
                    name: "Oak chair".into(),
                    price_new: Decimal::from(1_500_000),
                    quantity: 2,
                    ..CartItem::default()
                },
                CartItem {
                    product_id: ProductId::new("p2"),
                    name: "Cushion".into(),
                    price_new: Decimal::from(250_000),
                    quantity: 1,
                    ..CartItem::default()
                },
            ],
            total_price: Decimal::ZERO,
        };
        let view = CartView::from(&cart);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].line_total, "3.000.000 ₫");
        assert_eq!(view.total, "3.250.000 ₫");
    }
}
