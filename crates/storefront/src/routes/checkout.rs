//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::cart::Cart;
use hearth_core::order::OrderRequest;
use hearth_core::{Email, PaymentMethod};

use crate::backend::PlacedOrder;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{RequireAuth, push_flash};
use crate::models::{CurrentCustomer, Flash};
use crate::routes::cart::CartView;
use crate::state::AppState;
use crate::views::Chrome;

/// Delivery form as posted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub payment_method: String,
}

impl CheckoutForm {
    /// Prefill from the logged-in customer.
    fn for_customer(customer: &CurrentCustomer) -> Self {
        Self {
            name: customer.full_name.clone(),
            email: customer.email.clone(),
            phone: customer.phone_number.clone(),
            address: String::new(),
            payment_method: PaymentMethod::Cod.as_str().to_string(),
        }
    }

    /// Trimmed order body, or the first problem with the form.
    fn validate(&self) -> Result<OrderRequest, &'static str> {
        let name = self.name.trim();
        let phone = self.phone.trim();
        let address = self.address.trim();
        if name.is_empty() || phone.is_empty() || address.is_empty() || self.email.trim().is_empty()
        {
            return Err("Please fill in your name, email, phone number and address.");
        }
        let email = Email::parse(&self.email).map_err(|_| "Please enter a valid email address.")?;
        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| "Please choose a payment method.")?;

        Ok(OrderRequest {
            name: name.to_owned(),
            email: email.into_inner(),
            phone: phone.to_owned(),
            address: address.to_owned(),
            payment_method,
        })
    }

    /// Whether the radio button for `method` should be checked.
    #[must_use]
    pub fn is_method(&self, method: &str) -> bool {
        self.payment_method == method
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub chrome: Chrome,
    pub cart: CartView,
    pub is_empty: bool,
    pub form: CheckoutForm,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub chrome: Chrome,
}

/// Display the cart summary and delivery form.
#[instrument(skip(state, session, customer, credentials))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer, credentials): RequireAuth,
) -> impl IntoResponse {
    let chrome = Chrome::load(&state, &session).await;
    let form = CheckoutForm::for_customer(&customer);

    match state.backend().checkout(&credentials).await {
        Ok(cart) => page(chrome, &cart, form, None),
        Err(e) => {
            tracing::warn!("Failed to load checkout: {e}");
            page(chrome, &Cart::empty(), form, Some(e.user_message()))
        }
    }
}

fn page(chrome: Chrome, cart: &Cart, form: CheckoutForm, error: Option<String>) -> CheckoutTemplate {
    CheckoutTemplate {
        chrome,
        cart: CartView::from(cart),
        is_empty: cart.is_empty(),
        form,
        error,
    }
}

/// Place the order.
///
/// Cash on delivery lands on the confirmation page; `MoMo` hands the
/// customer over to the payment URL returned by the backend.
#[instrument(skip(state, session, credentials, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_, credentials): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let order = match form.validate() {
        Ok(order) => order,
        Err(message) => {
            let chrome = Chrome::load(&state, &session).await;
            let cart = state.backend().checkout(&credentials).await.unwrap_or_default();
            return page(chrome, &cart, form, Some(message.to_string())).into_response();
        }
    };

    match state.backend().place_order(&credentials, &order).await {
        Ok(PlacedOrder::Confirmed) => {
            add_breadcrumb("checkout", "Order placed", Some(&[("payment_method", "cod")]));
            Redirect::to("/order-confirmation").into_response()
        }
        Ok(PlacedOrder::Redirect(pay_url)) => {
            add_breadcrumb("checkout", "Redirected to payment", Some(&[("payment_method", "momo")]));
            Redirect::to(&pay_url).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to place order: {e}");
            push_flash(&session, Flash::error(e.user_message())).await;
            Redirect::to("/checkout").into_response()
        }
    }
}

/// Thank-you page.
#[instrument(skip(state, session))]
pub async fn confirmation(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    ConfirmationTemplate {
        chrome: Chrome::load(&state, &session).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: " Nguyen An ".into(),
            email: "an@mail.vn".into(),
            phone: "0901234567".into(),
            address: "12 Le Loi, District 1".into(),
            payment_method: "momo".into(),
        }
    }

    #[test]
    fn test_validate_trims_and_parses() {
        let order = form().validate();
        assert_eq!(
            order.map(|o| (o.name, o.payment_method)),
            Ok(("Nguyen An".to_string(), PaymentMethod::Momo))
        );
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut missing = form();
        missing.address = "  ".into();
        assert!(missing.validate().is_err());

        let mut bad_email = form();
        bad_email.email = "an-at-mail".into();
        assert_eq!(
            bad_email.validate().err(),
            Some("Please enter a valid email address.")
        );

        let mut bad_method = form();
        bad_method.payment_method = "card".into();
        assert_eq!(bad_method.validate().err(), Some("Please choose a payment method."));
    }

    #[test]
    fn test_prefill_defaults_to_cod() {
        let customer = CurrentCustomer {
            full_name: "Nguyen An".into(),
            email: "an@mail.vn".into(),
            ..CurrentCustomer::default()
        };
        let form = CheckoutForm::for_customer(&customer);
        assert!(form.is_method("cod"));
        assert_eq!(form.email, "an@mail.vn");
    }
}
