//! Ledger export handler

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, Response, StatusCode},
};
use serde::Deserialize;
use tracing::info;

use super::{parse_category, resolve_window};
use crate::{current_owner, AppError, AppState};
use spendcast_core::{export_expenses_csv, LedgerQuery};

/// Query parameters for expense export
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Output format (default: csv)
    #[serde(default = "default_format")]
    pub format: String,
    pub category: Option<String>,
    /// Start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    pub to: Option<String>,
}

fn default_format() -> String {
    "csv".to_string()
}

/// GET /api/export - Export the caller's expenses to CSV or JSON
pub async fn export_expenses(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ExportQuery>,
) -> Result<Response<Body>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let category = params.category.as_deref().map(parse_category).transpose()?;
    let window = resolve_window(params.from.as_deref(), params.to.as_deref())?;
    let query = LedgerQuery::new().category(category).window(window);

    let (body, content_type, filename) = match params.format.as_str() {
        "csv" => {
            let csv = export_expenses_csv(&state.db, owner.id, &query)?;
            let lines = csv.lines().count().saturating_sub(1);
            info!("Exported {} expenses to CSV", lines);
            (csv, "text/csv; charset=utf-8", "expenses.csv")
        }
        "json" => {
            let expenses = state.db.list_expenses(owner.id, &query)?;
            let json = serde_json::to_string_pretty(&expenses)
                .map_err(|e| AppError::internal(&e.to_string()))?;
            info!("Exported {} expenses to JSON", expenses.len());
            (json, "application/json", "expenses.json")
        }
        _ => return Err(AppError::bad_request("Invalid format. Use 'csv' or 'json'")),
    };

    state.db.log_audit(
        &owner.email,
        "export",
        Some("expense"),
        None,
        Some(&format!(
            "format={}, category={:?}, from={:?}, to={:?}",
            params.format, params.category, params.from, params.to
        )),
    )?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(body))
        .map_err(|e| AppError::internal(&e.to_string()))
}
