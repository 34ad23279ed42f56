//! Category tree route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::CategoryId;
use hearth_core::api::Credentials;
use hearth_core::catalog::{Category, CategoryPayload, find_category, parent_candidates};

use crate::error::AppError;
use crate::filters;
use crate::filters::image_url;
use crate::forms::CategoryForm;
use crate::middleware::{RequireAdminAuth, push_flash};
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;
use crate::views::{Choice, Layout, status_badge};

const LIST_PATH: &str = "/categories";

/// Deepest indentation class the stylesheet defines.
const MAX_DEPTH_CLASS: usize = 4;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(index))
        .route("/categories/new", get(new_form).post(create))
        .route("/categories/{id}/edit", get(edit_form).post(update))
}

/// One row of the indented tree table.
#[derive(Debug, Clone)]
pub struct CategoryRowView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub depth_class: String,
    pub position: i64,
    pub status: String,
    pub status_class: String,
    pub children: usize,
}

/// Depth-first rows, children right below their parent.
fn tree_rows(tree: &[Category]) -> Vec<CategoryRowView> {
    fn walk(nodes: &[Category], depth: usize, out: &mut Vec<CategoryRowView>) {
        for node in nodes {
            out.push(CategoryRowView {
                id: node.category_id.to_string(),
                name: node.name.clone(),
                image: image_url(node.thumbnail.as_deref()),
                depth_class: format!("depth-{}", depth.min(MAX_DEPTH_CLASS)),
                position: node.position,
                status: node.status.label().to_string(),
                status_class: status_badge(node.status).to_string(),
                children: node.subcategories.len(),
            });
            walk(&node.subcategories, depth + 1, out);
        }
    }

    let mut rows = Vec::new();
    walk(tree, 0, &mut rows);
    rows
}

/// Categories tree page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub layout: Layout,
    pub rows: Vec<CategoryRowView>,
    pub error: Option<String>,
}

/// Category create/edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub layout: Layout,
    pub heading: String,
    pub action: String,
    pub form: CategoryForm,
    pub parents: Vec<Choice>,
    pub statuses: Vec<Choice>,
    pub error: Option<String>,
}

/// Categories tree page handler.
///
/// GET /categories
#[instrument(skip(admin, auth, state, session))]
async fn index(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    let layout = Layout::load(&admin, &session, LIST_PATH).await;
    let (rows, error) = match state.backend().categories(&auth).await {
        Ok(tree) => (tree_rows(&tree), None),
        Err(e) => {
            tracing::error!("Failed to fetch categories: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };
    CategoriesIndexTemplate { layout, rows, error }
}

async fn render_form(
    admin: &CurrentAdmin,
    session: &Session,
    tree: &[Category],
    editing: Option<&CategoryId>,
    form: CategoryForm,
    error: Option<String>,
) -> CategoryFormTemplate {
    let (heading, action) = match editing {
        Some(id) => ("Edit category".to_string(), format!("{LIST_PATH}/{id}/edit")),
        None => ("New category".to_string(), format!("{LIST_PATH}/new")),
    };
    CategoryFormTemplate {
        layout: Layout::load(admin, session, &action).await,
        heading,
        action,
        parents: Choice::categories(&parent_candidates(tree, editing), &form.parent_id),
        statuses: Choice::statuses(&form.status),
        form,
        error,
    }
}

/// Check the form and that the chosen parent is a legal one.
fn validate(
    form: &CategoryForm,
    tree: &[Category],
    editing: Option<&CategoryId>,
) -> Result<CategoryPayload, String> {
    let payload = form.to_payload().map_err(str::to_string)?;
    if let Some(parent) = &payload.parent_id {
        let allowed = parent_candidates(tree, editing)
            .iter()
            .any(|option| &option.id == parent);
        if !allowed {
            return Err("Choose a parent category from the list.".to_string());
        }
    }
    Ok(payload)
}

async fn load_tree(state: &AppState, auth: &Credentials) -> Result<Vec<Category>, AppError> {
    Ok(state.backend().categories(auth).await?)
}

/// New category form.
///
/// GET /categories/new
#[instrument(skip(admin, auth, state, session))]
async fn new_form(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let tree = load_tree(&state, &auth).await?;
    Ok(render_form(&admin, &session, &tree, None, CategoryForm::blank(), None)
        .await
        .into_response())
}

/// Create a category.
///
/// POST /categories/new
#[instrument(skip(admin, auth, state, session, form))]
async fn create(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let tree = load_tree(&state, &auth).await?;
    let payload = match validate(&form, &tree, None) {
        Ok(payload) => payload,
        Err(message) => {
            return Ok(render_form(&admin, &session, &tree, None, form, Some(message))
                .await
                .into_response());
        }
    };

    match state.backend().create_category(&auth, &payload).await {
        Ok(message) => {
            tracing::info!(title = %payload.title, "Category created");
            push_flash(
                &session,
                Flash::success(message.unwrap_or_else(|| "Category created.".to_string())),
            )
            .await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(e) => {
            tracing::warn!("Failed to create category: {e}");
            Ok(render_form(&admin, &session, &tree, None, form, Some(e.user_message()))
                .await
                .into_response())
        }
    }
}

/// Edit category form.
///
/// GET /categories/{id}/edit
#[instrument(skip(admin, auth, state, session))]
async fn edit_form(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = CategoryId::new(id);
    let tree = load_tree(&state, &auth).await?;
    let category = find_category(&tree, &id)
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;
    let form = CategoryForm::from_category(category);
    Ok(render_form(&admin, &session, &tree, Some(&id), form, None)
        .await
        .into_response())
}

/// Save an edited category.
///
/// POST /categories/{id}/edit
#[instrument(skip(admin, auth, state, session, form))]
async fn update(
    RequireAdminAuth(admin, auth): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let id = CategoryId::new(id);
    let tree = load_tree(&state, &auth).await?;
    if find_category(&tree, &id).is_none() {
        return Err(AppError::NotFound(format!("category {id}")));
    }

    let payload = match validate(&form, &tree, Some(&id)) {
        Ok(payload) => payload,
        Err(message) => {
            return Ok(render_form(&admin, &session, &tree, Some(&id), form, Some(message))
                .await
                .into_response());
        }
    };

    match state.backend().update_category(&auth, &id, &payload).await {
        Ok(message) => {
            tracing::info!(category_id = %id, "Category updated");
            push_flash(
                &session,
                Flash::success(message.unwrap_or_else(|| "Category saved.".to_string())),
            )
            .await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(e) => {
            tracing::warn!("Failed to update category: {e}");
            Ok(render_form(&admin, &session, &tree, Some(&id), form, Some(e.user_message()))
                .await
                .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::CATEGORY_TITLE_REQUIRED;

    fn node(id: &str, name: &str, subcategories: Vec<Category>) -> Category {
        Category {
            category_id: CategoryId::new(id),
            name: name.into(),
            subcategories,
            ..Category::default()
        }
    }

    fn tree() -> Vec<Category> {
        vec![
            node(
                "c1",
                "Living room",
                vec![node("c2", "Sofas", vec![node("c3", "Corner sofas", vec![])])],
            ),
            node("c4", "Lighting", vec![]),
        ]
    }

    #[test]
    fn test_tree_rows_are_depth_first() {
        let rows = tree_rows(&tree());
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Living room", "Sofas", "Corner sofas", "Lighting"]);
        let depths: Vec<_> = rows.iter().map(|r| r.depth_class.as_str()).collect();
        assert_eq!(depths, ["depth-0", "depth-1", "depth-2", "depth-0"]);
        assert_eq!(rows[0].children, 1);
    }

    #[test]
    fn test_parent_cannot_be_own_descendant() {
        let tree = tree();
        let form = CategoryForm {
            title: "Living room".into(),
            parent_id: "c3".into(),
            ..CategoryForm::blank()
        };
        assert!(validate(&form, &tree, Some(&CategoryId::new("c1"))).is_err());

        let moved = CategoryForm {
            title: "Sofas".into(),
            parent_id: "c4".into(),
            ..CategoryForm::blank()
        };
        let payload = validate(&moved, &tree, Some(&CategoryId::new("c2")));
        assert_eq!(payload.ok().and_then(|p| p.parent_id), Some(CategoryId::new("c4")));
    }

    #[test]
    fn test_title_required() {
        assert_eq!(
            validate(&CategoryForm::blank(), &tree(), None),
            Err(CATEGORY_TITLE_REQUIRED.to_string())
        );
    }
}
