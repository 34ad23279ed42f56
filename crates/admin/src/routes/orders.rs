//! Order route handlers.
//!
//! Orders are read-only here. There is no per-order endpoint, so the detail
//! page is served from the cached order list.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::order::{Order, OrderFilter};
use hearth_core::{Money, OrderId, OrderStatus, ProductId};

use crate::error::AppError;
use crate::filters;
use crate::filters::image_url;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::{Choice, Layout, format_datetime};

const LIST_PATH: &str = "/orders";

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
}

/// Order table filter.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilterQuery {
    pub status: Option<String>,
}

/// Order row for templates.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub short_id: String,
    pub customer: String,
    pub phone: String,
    pub items: usize,
    pub total: String,
    pub status: String,
    pub status_class: String,
    pub payment: String,
    pub payment_class: String,
    pub created_at: String,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        let status = order.latest_status();
        Self {
            id: order.id.to_string(),
            short_id: order.id.short().to_string(),
            customer: order.recipient.name.clone(),
            phone: order.recipient.phone.clone(),
            items: order.lines.iter().map(|l| l.quantity as usize).sum(),
            total: order.total_price().to_string(),
            status: status.label().to_string(),
            status_class: status.badge_class().to_string(),
            payment: order.payment_status.label().to_string(),
            payment_class: order.payment_status.badge_class().to_string(),
            created_at: format_datetime(order.created_at),
        }
    }
}

/// Line item row of the detail page.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub product_id: String,
    pub title: String,
    pub image: String,
    pub quantity: u32,
    pub unit_price: String,
    pub discount: String,
    pub line_total: String,
}

/// One step of the status history.
#[derive(Debug, Clone)]
pub struct StatusStepView {
    pub label: String,
    pub badge_class: String,
    pub updated_at: String,
}

/// Order detail for templates.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub lines: Vec<OrderLineView>,
    pub history: Vec<StatusStepView>,
    pub status: String,
    pub status_class: String,
    pub payment_method: String,
    pub payment_status: String,
    pub payment_class: String,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub created_at: String,
}

/// Title and thumbnail of a product, for labelling order lines.
struct ProductLabel {
    title: String,
    image: String,
}

impl OrderDetailView {
    fn new(order: &Order, products: &HashMap<ProductId, ProductLabel>) -> Self {
        let status = order.latest_status();
        let lines = order
            .lines
            .iter()
            .map(|line| {
                let label = products.get(&line.product_id);
                OrderLineView {
                    product_id: line.product_id.to_string(),
                    title: label.map_or_else(|| line.product_id.to_string(), |l| l.title.clone()),
                    image: label.map_or_else(|| image_url(None), |l| l.image.clone()),
                    quantity: line.quantity,
                    unit_price: line.unit_price().to_string(),
                    discount: format!("{}%", line.discount_percentage.normalize()),
                    line_total: line.line_total().to_string(),
                }
            })
            .collect();
        let history = order
            .status_history
            .iter()
            .map(|entry| StatusStepView {
                label: entry.status.label().to_string(),
                badge_class: entry.status.badge_class().to_string(),
                updated_at: format_datetime(entry.updated_at),
            })
            .collect();

        Self {
            id: order.id.to_string(),
            name: order.recipient.name.clone(),
            email: order.recipient.email.clone(),
            phone: order.recipient.phone.clone(),
            address: order.recipient.address.clone(),
            lines,
            history,
            status: status.label().to_string(),
            status_class: status.badge_class().to_string(),
            payment_method: order.payment_method.label().to_string(),
            payment_status: order.payment_status.label().to_string(),
            payment_class: order.payment_status.badge_class().to_string(),
            subtotal: order.subtotal().to_string(),
            shipping: Money::new(order.shipping_fee).to_string(),
            total: order.total_price().to_string(),
            created_at: format_datetime(order.created_at),
        }
    }
}

/// Orders list page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRowView>,
    pub statuses: Vec<Choice>,
    pub error: Option<String>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderDetailView,
}

fn status_choices(filter: OrderFilter) -> Vec<Choice> {
    let mut choices = vec![Choice {
        value: OrderFilter::All.as_str().to_string(),
        label: "All statuses".to_string(),
        selected: filter == OrderFilter::All,
    }];
    choices.extend(OrderStatus::ALL.into_iter().map(|status| Choice {
        value: status.as_str().to_string(),
        label: status.label().to_string(),
        selected: filter == OrderFilter::Latest(status),
    }));
    choices
}

/// Orders list page handler.
///
/// GET /orders
#[instrument(skip(admin, auth, state, session))]
async fn index(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrderFilterQuery>,
) -> impl IntoResponse {
    let layout = Layout::load(&admin, &session, LIST_PATH).await;
    let filter = OrderFilter::from_param(query.status.as_deref());

    let (orders, error) = match state.backend().orders(&admin.cache_scope, &auth).await {
        Ok(orders) => (
            orders
                .iter()
                .filter(|o| filter.matches(o))
                .map(OrderRowView::from)
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::error!("Failed to fetch orders: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };

    OrdersIndexTemplate {
        layout,
        orders,
        statuses: status_choices(filter),
        error,
    }
}

/// Order detail page handler.
///
/// GET /orders/{id}
#[instrument(skip(admin, auth, state, session))]
async fn show(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = OrderId::new(id);
    let order = state
        .backend()
        .orders(&admin.cache_scope, &auth)
        .await?
        .into_iter()
        .find(|o| o.id == id)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    // Line titles are cosmetic; fall back to ids if the catalog is down.
    let products: HashMap<ProductId, ProductLabel> = match state
        .backend()
        .products(&admin.cache_scope, &auth)
        .await
    {
        Ok(products) => products
            .into_iter()
            .map(|p| {
                let label = ProductLabel {
                    image: image_url(p.thumbnail.as_deref()),
                    title: p.title,
                };
                (p.id, label)
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch products for order lines: {e}");
            HashMap::new()
        }
    };

    Ok(OrderShowTemplate {
        layout: Layout::load(&admin, &session, &format!("{LIST_PATH}/{id}")).await,
        order: OrderDetailView::new(&order, &products),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order() -> Order {
        serde_json::from_value(json!({
            "_id": "665f1c2ab7e4a10012345678",
            "user_infor": {"name": "Lan", "phone": "0901234567", "address": "12 Ly Thai To"},
            "product": [
                {"_id": "l1", "product_id": "p1", "price": 1000000, "quantity": 2, "discountPercentage": 10},
                {"_id": "l2", "product_id": "p9", "price": 500000, "quantity": 1}
            ],
            "shippingFee": 30000,
            "orderStatus": [
                {"status": "Receiving orders"},
                {"status": "Being delivered"}
            ],
            "paymentMethod": "cod",
            "paymentStatus": "pending"
        }))
        .unwrap_or_default()
    }

    #[test]
    fn test_order_row() {
        let row = OrderRowView::from(&order());
        assert_eq!(row.short_id, "345678");
        assert_eq!(row.items, 3);
        assert_eq!(row.total, "2.330.000 ₫");
        assert_eq!(row.status, "Out for delivery");
        assert_eq!(row.payment, "Pending");
    }

    #[test]
    fn test_detail_falls_back_to_product_id() {
        let mut products = HashMap::new();
        products.insert(
            ProductId::new("p1"),
            ProductLabel {
                title: "Oak chair".into(),
                image: "/static/img/oak.jpg".into(),
            },
        );
        let detail = OrderDetailView::new(&order(), &products);
        assert_eq!(detail.lines[0].title, "Oak chair");
        assert_eq!(detail.lines[0].unit_price, "900.000 ₫");
        assert_eq!(detail.lines[1].title, "p9");
        assert_eq!(detail.subtotal, "2.300.000 ₫");
        assert_eq!(detail.shipping, "30.000 ₫");
        assert_eq!(detail.history.len(), 2);
        assert_eq!(detail.payment_method, "Cash on delivery");
    }

    #[test]
    fn test_status_choices_mark_filter() {
        let choices = status_choices(OrderFilter::Latest(OrderStatus::Delivered));
        assert_eq!(choices.len(), OrderStatus::ALL.len() + 1);
        let selected: Vec<_> = choices.iter().filter(|c| c.selected).map(|c| c.value.as_str()).collect();
        assert_eq!(selected, ["Delivered"]);
    }
}
