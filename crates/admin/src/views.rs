//! Display data shared by every back-office page.

use askama::Template;
use askama_web::WebTemplate;
use chrono::{DateTime, Utc};
use tower_sessions::Session;

use hearth_core::catalog::CategoryOption;
use hearth_core::{ActiveStatus, StatusFilter};

use crate::filters;
use crate::middleware::take_flash;
use crate::models::{CurrentAdmin, Flash};

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.clone(),
        }
    }
}

/// Sidebar, signed-in admin and notice banner common to every page.
#[derive(Debug, Clone)]
pub struct Layout {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
}

impl Layout {
    /// Layout for `current_path`, consuming any queued notice.
    pub async fn load(admin: &CurrentAdmin, session: &Session, current_path: &str) -> Self {
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: current_path.to_string(),
            flash: take_flash(session).await,
        }
    }

    /// Whether a sidebar entry is the current section.
    #[must_use]
    pub fn is_active(&self, section: &str) -> bool {
        self.current_path == section || self.current_path.starts_with(&format!("{section}/"))
    }
}

/// `dd/mm/YYYY HH:MM`, or a dash when the backend sent no date.
#[must_use]
pub fn format_datetime(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || "-".to_string(),
        |dt| dt.format("%d/%m/%Y %H:%M").to_string(),
    )
}

/// CSS badge modifier for an active/inactive status.
#[must_use]
pub const fn status_badge(status: ActiveStatus) -> &'static str {
    match status {
        ActiveStatus::Active => "badge-success",
        ActiveStatus::Inactive => "badge-muted",
        ActiveStatus::Unknown => "badge-warning",
    }
}

/// An `<option>` of a select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl Choice {
    fn new(value: &str, label: &str, selected: bool) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected,
        }
    }

    /// The all/active/inactive filter.
    #[must_use]
    pub fn status_filters(current: StatusFilter) -> Vec<Self> {
        [StatusFilter::All, StatusFilter::Active, StatusFilter::Inactive]
            .into_iter()
            .map(|filter| {
                let label = match filter {
                    StatusFilter::All => "All statuses",
                    StatusFilter::Active => "Active",
                    StatusFilter::Inactive => "Inactive",
                };
                Self::new(filter.as_str(), label, filter == current)
            })
            .collect()
    }

    /// Active/inactive choices for an edit form.
    #[must_use]
    pub fn statuses(current: &str) -> Vec<Self> {
        [ActiveStatus::Active, ActiveStatus::Inactive]
            .into_iter()
            .map(|status| Self::new(status.as_str(), status.label(), status.as_str() == current))
            .collect()
    }

    /// Flattened categories, each child labelled with its parent's name.
    #[must_use]
    pub fn categories(options: &[CategoryOption], current: &str) -> Vec<Self> {
        options
            .iter()
            .map(|opt| Self::new(opt.id.as_str(), &opt.name, opt.id.as_str() == current))
            .collect()
    }
}

/// A hidden field carried through a confirmation step.
#[derive(Debug, Clone)]
pub struct HiddenField {
    pub name: String,
    pub value: String,
}

impl HiddenField {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// The confirmation step shown before a status change or delete.
///
/// Re-posts the same action with `confirm=yes` and every hidden field.
#[derive(Template, WebTemplate)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate {
    pub layout: Layout,
    pub title: String,
    pub message: String,
    pub action: String,
    pub fields: Vec<HiddenField>,
    pub cancel_href: String,
    pub danger: bool,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_active_section() {
        let layout = Layout {
            admin_user: AdminUserView {
                name: "Mai".into(),
                email: "mai@hearthhome.vn".into(),
            },
            current_path: "/products/p1/edit".into(),
            flash: None,
        };
        assert!(layout.is_active("/products"));
        assert!(!layout.is_active("/product"));
        assert!(!layout.is_active("/users"));
    }

    #[test]
    fn test_status_filter_choices() {
        let choices = Choice::status_filters(StatusFilter::Inactive);
        let selected: Vec<_> = choices.iter().filter(|c| c.selected).map(|c| c.value.as_str()).collect();
        assert_eq!(choices.len(), 3);
        assert_eq!(selected, ["inactive"]);
    }

    #[test]
    fn test_format_datetime() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 0).single();
        assert_eq!(format_datetime(dt), "09/03/2025 14:05");
        assert_eq!(format_datetime(None), "-");
    }
}
