//! Authentication route handlers for admin.
//!
//! Login is delegated to the backend's `admin/login`; the returned token is
//! kept in the server-side session and forwarded on every backend call.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::api::BackendError;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, push_flash, set_current_admin};
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;

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
pub struct LoginPageTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Message shown for a refused login.
fn login_error_message(error: &BackendError) -> String {
    match error {
        BackendError::Unauthorized(Some(message)) => message.clone(),
        BackendError::Unauthorized(None) => "Incorrect email or password.".to_string(),
        other => other.user_message(),
    }
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/products").into_response();
    }
    LoginPageTemplate {
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Check credentials against the backend.
///
/// POST /auth/login
#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_owned();
    if email.is_empty() || form.password.is_empty() {
        return rejected(email, "Please enter your email and password.".into());
    }

    let login = match state.backend().login(&email, &form.password).await {
        Ok(login) => login,
        Err(e) => {
            tracing::warn!("Admin login failed: {e}");
            return rejected(email, login_error_message(&e));
        }
    };

    let admin = CurrentAdmin::from_login(login.user.as_ref(), &email);
    if let Err(e) = set_current_admin(&session, &admin, &login.credentials).await {
        tracing::error!("Failed to set session: {e}");
        return rejected(email, "Could not start your session. Please try again.".into());
    }

    set_sentry_user(&admin.id, Some(&admin.email));
    tracing::info!(admin = %admin.email, "Admin logged in");
    push_flash(&session, Flash::success(format!("Signed in as {}", admin.name))).await;
    Redirect::to("/products").into_response()
}

fn rejected(email: String, message: String) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        LoginPageTemplate {
            email,
            error: Some(message),
        },
    )
        .into_response()
}

/// Logout and clear session.
///
/// POST /auth/logout
#[instrument(skip(state, session, admin))]
async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAdminAuth(admin): OptionalAdminAuth,
) -> impl IntoResponse {
    if let Some(admin) = admin {
        state.backend().forget_session(&admin.cache_scope).await;
    }
    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();

    Redirect::to("/auth/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_message() {
        assert_eq!(
            login_error_message(&BackendError::Unauthorized(Some("Account locked".into()))),
            "Account locked"
        );
        assert_eq!(
            login_error_message(&BackendError::Unauthorized(None)),
            "Incorrect email or password."
        );
    }
}
