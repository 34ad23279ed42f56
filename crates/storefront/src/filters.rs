//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Shown wherever a product or cart line has no usable image.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Image URL to render, falling back to the placeholder.
///
/// The backend sometimes stores the strings `"null"` or `"undefined"`.
#[must_use]
pub fn image_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || url == "null" || url == "undefined" {
        PLACEHOLDER_IMAGE.to_string()
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_placeholder() {
        assert_eq!(image_url(""), PLACEHOLDER_IMAGE);
        assert_eq!(image_url("undefined"), PLACEHOLDER_IMAGE);
        assert_eq!(image_url(" null "), PLACEHOLDER_IMAGE);
        assert_eq!(image_url("https://img.hearth.vn/a.jpg"), "https://img.hearth.vn/a.jpg");
    }
}
