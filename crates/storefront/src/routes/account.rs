//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::Money;
use hearth_core::account::{ProfileUpdate, User, validate_password_change};
use hearth_core::order::Order;

use crate::filters;
use crate::filters::image_url;
use crate::middleware::{RequireAuth, push_flash, set_current_customer};
use crate::models::{CurrentCustomer, Flash};
use crate::state::AppState;
use crate::views::Chrome;

/// Profile display data for templates.
#[derive(Clone, Default)]
pub struct ProfileView {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub avatar: String,
    pub avatar_url: String,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        let avatar = user.avatar.clone().unwrap_or_default();
        Self {
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            avatar_url: image_url(&avatar),
            avatar,
        }
    }
}

/// Address display data for templates.
#[derive(Clone)]
pub struct AddressView {
    pub line: String,
    pub is_default: bool,
}

/// Order line display data for templates.
#[derive(Clone)]
pub struct OrderLineView {
    pub product: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub number: String,
    pub placed_at: String,
    pub lines: Vec<OrderLineView>,
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub payment_method: &'static str,
    pub payment_status: &'static str,
    pub payment_class: &'static str,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let status = order.latest_status();
        Self {
            number: order.id.short().to_uppercase(),
            placed_at: order
                .created_at
                .map(|at| at.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_default(),
            lines: order
                .lines
                .iter()
                .map(|line| OrderLineView {
                    product: line.product_id.short().to_string(),
                    unit_price: line.unit_price().to_string(),
                    quantity: line.quantity,
                    line_total: line.line_total().to_string(),
                })
                .collect(),
            subtotal: order.subtotal().to_string(),
            shipping_fee: Money::new(order.shipping_fee).to_string(),
            total: order.total_price().to_string(),
            status: status.label(),
            status_class: status.badge_class(),
            payment_method: order.payment_method.label(),
            payment_status: order.payment_status.label(),
            payment_class: order.payment_status.badge_class(),
        }
    }
}

/// `?addresses=all` shows every saved address.
#[derive(Debug, Default, Deserialize)]
pub struct AccountQuery {
    pub addresses: Option<String>,
}

impl AccountQuery {
    fn show_all_addresses(&self) -> bool {
        self.addresses.as_deref() == Some("all")
    }
}

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub avatar: String,
}

/// Password form data.
#[derive(Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub chrome: Chrome,
    pub profile: ProfileView,
    pub addresses: Vec<AddressView>,
    pub has_address_toggle: bool,
    pub showing_all_addresses: bool,
    pub error: Option<String>,
}

/// Password page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/password.html")]
pub struct PasswordTemplate {
    pub chrome: Chrome,
    pub error: Option<String>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub chrome: Chrome,
    pub orders: Vec<OrderView>,
    pub error: Option<String>,
}

/// Display the profile.
#[instrument(skip(state, session, credentials))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_, credentials): RequireAuth,
    Query(query): Query<AccountQuery>,
) -> impl IntoResponse {
    let chrome = Chrome::load(&state, &session).await;
    let show_all = query.show_all_addresses();

    match state.backend().account(&credentials).await {
        Ok(user) => AccountIndexTemplate {
            chrome,
            profile: ProfileView::from(&user),
            addresses: user
                .visible_addresses(show_all)
                .into_iter()
                .map(|a| AddressView {
                    line: a.one_line(),
                    is_default: a.is_default,
                })
                .collect(),
            has_address_toggle: user.has_address_toggle(),
            showing_all_addresses: show_all,
            error: None,
        },
        Err(e) => {
            tracing::warn!("Failed to load account: {e}");
            AccountIndexTemplate {
                chrome,
                profile: ProfileView::default(),
                addresses: Vec::new(),
                has_address_toggle: false,
                showing_all_addresses: show_all,
                error: Some(e.user_message()),
            }
        }
    }
}

/// Save the profile.
///
/// Position and status are not editable by customers; they are carried over
/// from the account as fetched.
#[instrument(skip(state, session, customer, credentials, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer, credentials): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Response {
    if form.full_name.trim().is_empty() || form.email.trim().is_empty() {
        push_flash(&session, Flash::error("Name and email are required.")).await;
        return Redirect::to("/account").into_response();
    }

    let current = match state.backend().account(&credentials).await {
        Ok(user) => user,
        Err(e) => {
            push_flash(&session, Flash::error(e.user_message())).await;
            return Redirect::to("/account").into_response();
        }
    };

    let update = ProfileUpdate::new(
        &form.full_name,
        &form.email,
        &form.phone_number,
        &form.avatar,
        &current.position,
        current.status,
    );

    match state.backend().update_account(&credentials, &update).await {
        Ok(message) => {
            // Keep the header greeting in step with the saved profile.
            let refreshed = CurrentCustomer {
                id: customer.id,
                full_name: update.full_name.clone(),
                email: update.email.clone(),
                phone_number: update.phone_number.clone(),
            };
            if let Err(e) = set_current_customer(&session, &refreshed, &credentials).await {
                tracing::warn!("Failed to refresh session profile: {e}");
            }
            push_flash(
                &session,
                Flash::success(message.unwrap_or_else(|| "Profile updated".to_string())),
            )
            .await;
        }
        Err(e) => {
            tracing::error!("Failed to save profile: {e}");
            push_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/account").into_response()
}

/// Display the password form.
#[instrument(skip(state, session, _auth))]
pub async fn password_page(
    State(state): State<AppState>,
    session: Session,
    _auth: RequireAuth,
) -> impl IntoResponse {
    PasswordTemplate {
        chrome: Chrome::load(&state, &session).await,
        error: None,
    }
}

/// Change the password.
#[instrument(skip(state, session, credentials, form))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_, credentials): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Response {
    let password = match validate_password_change(&form.new_password, &form.confirm_password) {
        Ok(password) => password.to_owned(),
        Err(e) => {
            return PasswordTemplate {
                chrome: Chrome::load(&state, &session).await,
                error: Some(e.to_string()),
            }
            .into_response();
        }
    };

    let result = match state.backend().account(&credentials).await {
        Ok(user) => {
            let update = ProfileUpdate::from_user(&user).with_password(password);
            state.backend().update_account(&credentials, &update).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => {
            push_flash(&session, Flash::success("Password changed")).await;
            Redirect::to("/account").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to change password: {e}");
            push_flash(&session, Flash::error(e.user_message())).await;
            Redirect::to("/account/password").into_response()
        }
    }
}

/// Display the order history.
#[instrument(skip(state, session, credentials))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_, credentials): RequireAuth,
) -> impl IntoResponse {
    let chrome = Chrome::load(&state, &session).await;
    let (orders, error) = match state.backend().my_orders(&credentials).await {
        Ok(orders) => (orders.iter().map(OrderView::from).collect(), None),
        Err(e) => {
            tracing::warn!("Failed to load orders: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };

    OrdersTemplate {
        chrome,
        orders,
        error,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_order_view_totals_and_status() {
        let order: Order = serde_json::from_value(json!({
            "_id": "665f1c2ab7e4a10012345678",
            "product": [
                {"_id": "l1", "product_id": "665f00000000000000000001", "price": 1_000_000,
                 "quantity": 2, "discountPercentage": 10}
            ],
            "shippingFee": 30_000,
            "orderStatus": [{"status": "Being delivered"}],
            "paymentMethod": "cod",
            "createdAt": "2025-02-03T04:05:06Z"
        }))
        .unwrap_or_default();

        let view = OrderView::from(&order);
        assert_eq!(view.subtotal, "1.800.000 ₫");
        assert_eq!(view.total, "1.830.000 ₫");
        assert_eq!(view.placed_at, "03/02/2025 04:05");
        assert_eq!(view.payment_method, "Cash on delivery");
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.status, "Out for delivery");
    }

    #[test]
    fn test_address_query() {
        let all = AccountQuery {
            addresses: Some("all".into()),
        };
        assert!(all.show_all_addresses());
        assert!(!AccountQuery::default().show_all_addresses());
    }
}
