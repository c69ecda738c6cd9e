//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analytics;
pub mod audit;
pub mod expenses;
pub mod export;
pub mod extract;
pub mod reports;

// Re-export all handlers for use in router
pub use analytics::*;
pub use audit::*;
pub use expenses::*;
pub use export::*;
pub use extract::*;
pub use reports::*;

use chrono::NaiveDate;
use spendcast_core::models::{Category, TimeWindow};

use crate::AppError;

/// Parse a category path or query value
pub(crate) fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse().map_err(|e: String| AppError::bad_request(&e))
}

fn parse_date(raw: Option<&str>, which: &str) -> Result<Option<NaiveDate>, AppError> {
    raw.map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::bad_request(&format!("Invalid {} date format (use YYYY-MM-DD)", which)))
}

/// Build a whole-day window from optional `from`/`to` query dates
pub(crate) fn resolve_window(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<TimeWindow>, AppError> {
    let from = parse_date(from, "from")?;
    let to = parse_date(to, "to")?;
    Ok(TimeWindow::between(from, to)?)
}
