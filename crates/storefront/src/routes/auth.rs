//! Authentication route handlers.
//!
//! Login is delegated to the backend; the returned token and cart id are
//! kept in the server-side session and never reach the browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::api::BackendError;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_customer, push_flash, set_current_customer};
use crate::models::{CurrentCustomer, Flash};
use crate::state::AppState;
use crate::views::Chrome;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub chrome: Chrome,
    pub email: String,
    pub error: Option<String>,
}

/// Message shown for a refused login.
fn login_error_message(error: &BackendError) -> String {
    match error {
        BackendError::Unauthorized(Some(message)) => message.clone(),
        BackendError::Unauthorized(None) => "Incorrect email or password.".to_string(),
        other => other.user_message(),
    }
}

/// Display the login page.
#[instrument(skip(state, session, customer))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Response {
    if customer.is_some() {
        return Redirect::to("/account").into_response();
    }

    LoginTemplate {
        chrome: Chrome::load(&state, &session).await,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_owned();
    if email.is_empty() || form.password.is_empty() {
        return rejected(&state, &session, email, "Please enter your email and password.".into())
            .await;
    }

    let login = match state.backend().login(&email, &form.password).await {
        Ok(login) => login,
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            return rejected(&state, &session, email, login_error_message(&e)).await;
        }
    };

    let customer = CurrentCustomer::from_login(login.user.as_ref(), &email);
    if let Err(e) = set_current_customer(&session, &customer, &login.credentials).await {
        tracing::error!("Failed to set session: {e}");
        return rejected(
            &state,
            &session,
            email,
            "Could not start your session. Please try again.".into(),
        )
        .await;
    }

    set_sentry_user(&customer.id, Some(&customer.email));
    push_flash(
        &session,
        Flash::success(format!("Welcome back, {}", customer.display_name())),
    )
    .await;
    Redirect::to("/").into_response()
}

async fn rejected(state: &AppState, session: &Session, email: String, message: String) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        LoginTemplate {
            chrome: Chrome::load(state, session).await,
            email,
            error: Some(message),
        },
    )
        .into_response()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_customer(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_message() {
        assert_eq!(
            login_error_message(&BackendError::Unauthorized(Some("Wrong password".into()))),
            "Wrong password"
        );
        assert_eq!(
            login_error_message(&BackendError::Unauthorized(None)),
            "Incorrect email or password."
        );
    }
}
