//! User account route handlers.
//!
//! Accounts can only be activated or deactivated from the back-office. The
//! detail page is served from the cached list.

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

use hearth_core::account::{BulkStatusChange, User, filter_by_status};
use hearth_core::api::Credentials;
use hearth_core::{ActiveStatus, StatusFilter, UserId};

use crate::error::AppError;
use crate::filters;
use crate::filters::image_url;
use crate::forms::{ConfirmForm, SelectionForm, return_path};
use crate::middleware::{RequireAdminAuth, push_flash};
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;
use crate::views::{Choice, ConfirmTemplate, HiddenField, Layout, status_badge};

const LIST_PATH: &str = "/users";

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/bulk-status", post(bulk_status))
        .route("/users/{id}", get(show))
        .route("/users/{id}/status", post(change_status))
}

/// Table filter.
#[derive(Debug, Default, Deserialize)]
pub struct UserFilterQuery {
    pub status: Option<String>,
}

/// Detail page query.
#[derive(Debug, Default, Deserialize)]
pub struct UserDetailQuery {
    pub addresses: Option<String>,
}

impl UserDetailQuery {
    fn show_all(&self) -> bool {
        self.addresses.as_deref() == Some("all")
    }
}

/// User row for templates.
#[derive(Debug, Clone)]
pub struct UserRowView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub avatar: String,
    pub position: String,
    pub status: String,
    pub status_class: String,
    pub toggle_label: String,
}

impl From<&User> for UserRowView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone_number.clone(),
            avatar: image_url(user.avatar.as_deref()),
            position: user.position.clone(),
            status: user.status.label().to_string(),
            status_class: status_badge(user.status).to_string(),
            toggle_label: if user.status.toggled() == ActiveStatus::Active {
                "Activate".to_string()
            } else {
                "Deactivate".to_string()
            },
        }
    }
}

/// A saved address on the detail page.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub line: String,
    pub is_default: bool,
}

/// Users list page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub layout: Layout,
    pub users: Vec<UserRowView>,
    pub statuses: Vec<Choice>,
    pub return_to: String,
    pub error: Option<String>,
}

/// User detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/show.html")]
pub struct UserShowTemplate {
    pub layout: Layout,
    pub user: UserRowView,
    pub addresses: Vec<AddressView>,
    pub has_address_toggle: bool,
    pub show_all_addresses: bool,
    pub return_to: String,
}

/// Users list page handler.
///
/// GET /users
#[instrument(skip(admin, auth, state, session))]
async fn index(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<UserFilterQuery>,
) -> impl IntoResponse {
    let layout = Layout::load(&admin, &session, LIST_PATH).await;
    let filter = StatusFilter::from_param(query.status.as_deref());

    let (users, error) = match state.backend().users(&admin.cache_scope, &auth).await {
        Ok(users) => (
            filter_by_status(&users, filter)
                .into_iter()
                .map(UserRowView::from)
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::error!("Failed to fetch users: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };

    UsersIndexTemplate {
        layout,
        users,
        statuses: Choice::status_filters(filter),
        return_to: format!("{LIST_PATH}?status={}", filter.as_str()),
        error,
    }
}

async fn find_user(
    state: &AppState,
    admin: &CurrentAdmin,
    auth: &Credentials,
    id: &UserId,
) -> Result<User, AppError> {
    state
        .backend()
        .users(&admin.cache_scope, auth)
        .await?
        .into_iter()
        .find(|u| &u.id == id)
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// User detail page handler.
///
/// GET /users/{id}
#[instrument(skip(admin, auth, state, session))]
async fn show(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<UserDetailQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = UserId::new(id);
    let user = find_user(&state, &admin, &auth, &id).await?;
    let show_all = query.show_all();
    let addresses = user
        .visible_addresses(show_all)
        .into_iter()
        .map(|a| AddressView {
            line: a.one_line(),
            is_default: a.is_default,
        })
        .collect();
    let path = format!("{LIST_PATH}/{id}");

    Ok(UserShowTemplate {
        layout: Layout::load(&admin, &session, &path).await,
        addresses,
        has_address_toggle: user.has_address_toggle(),
        show_all_addresses: show_all,
        user: UserRowView::from(&user),
        return_to: path,
    })
}

/// Activate or deactivate one account, after confirmation.
///
/// POST /users/{id}/status
#[instrument(skip(admin, auth, state, session, form))]
async fn change_status(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> Result<Response, AppError> {
    let id = UserId::new(id);
    let user = find_user(&state, &admin, &auth, &id).await?;
    let target = user.status.toggled();
    let back = return_path(form.return_to.as_deref(), LIST_PATH);

    if !form.is_confirmed() {
        return Ok(ConfirmTemplate {
            layout: Layout::load(&admin, &session, LIST_PATH).await,
            title: "Change account status".to_string(),
            message: format!(
                "Set the account of {} to {}?",
                user.full_name,
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
        .change_user_status(&admin.cache_scope, &auth, &id, target)
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = %id, status = %target, "User status changed");
            Flash::success(format!(
                "{} is now {}.",
                user.full_name,
                target.label().to_lowercase()
            ))
        }
        Err(e) => {
            tracing::warn!("Failed to change user status: {e}");
            Flash::error(e.user_message())
        }
    };
    push_flash(&session, flash).await;
    Ok(Redirect::to(&back).into_response())
}

/// Set the status of the ticked accounts, after confirmation.
///
/// POST /users/bulk-status
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
            title: "Change account status".to_string(),
            message: format!(
                "Set {} selected account(s) to {}?",
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
        .change_users_status(&admin.cache_scope, &auth, &change)
        .await
    {
        Ok(()) => Flash::success(format!(
            "{} account(s) set to {}.",
            change.ids.len(),
            change.value.label().to_lowercase()
        )),
        Err(e) => {
            tracing::warn!("Failed to change user statuses: {e}");
            Flash::error(e.user_message())
        }
    };
    push_flash(&session, flash).await;
    Redirect::to(&back).into_response()
}
