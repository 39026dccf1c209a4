//! Custom Askama template filters.

use std::fmt::Display;

use thread_hanger_core::CURRENCY_LABEL;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for boutique.css, computed at build time.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("BOUTIQUE_CSS_HASH"))
}

/// Formats a price with the currency label, e.g. `PKR 1,500`.
///
/// Usage in templates: `{{ product.price|pkr }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn pkr(price: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("{CURRENCY_LABEL} {price}"))
}
