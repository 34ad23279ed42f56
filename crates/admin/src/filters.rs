//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Shown wherever a row has no usable image.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Image URL to render, falling back to the placeholder for blank values
/// and the `"null"`/`"undefined"` strings the backend sometimes stores.
#[must_use]
pub fn image_url(url: Option<&str>) -> String {
    match url.map(str::trim) {
        Some(url) if !url.is_empty() && url != "null" && url != "undefined" => url.to_string(),
        _ => PLACEHOLDER_IMAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url() {
        assert_eq!(image_url(None), PLACEHOLDER_IMAGE);
        assert_eq!(image_url(Some("undefined")), PLACEHOLDER_IMAGE);
        assert_eq!(image_url(Some("https://img.hearth.vn/a.jpg")), "https://img.hearth.vn/a.jpg");
    }
}
