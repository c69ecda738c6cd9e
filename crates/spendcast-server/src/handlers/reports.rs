//! Summary and statistics handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::resolve_window;
use crate::{current_owner, AppError, AppState, MAX_PAGE_LIMIT};
use spendcast_core::analytics::Aggregator;
use spendcast_core::models::{
    Expense, MonthlySummary, OverallStatistics, WindowSummary, YearlySummary,
};

/// GET /api/summary - Summary of the current calendar month
pub async fn current_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MonthlySummary>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let summary = Aggregator::new(&state.db).current_month_summary(owner.id, Utc::now())?;

    state.db.log_audit(
        &owner.email,
        "report",
        Some("monthly_summary"),
        None,
        Some(&format!("year={}, month={}", summary.year, summary.month)),
    )?;

    Ok(Json(summary))
}

/// GET /api/summary/:year/:month - Summary of one calendar month
pub async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(i32, u32)>,
    headers: HeaderMap,
) -> Result<Json<MonthlySummary>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let summary = Aggregator::new(&state.db).monthly_summary(owner.id, year, month)?;

    state.db.log_audit(
        &owner.email,
        "report",
        Some("monthly_summary"),
        None,
        Some(&format!("year={}, month={}", year, month)),
    )?;

    Ok(Json(summary))
}

/// GET /api/summary/:year - Month-by-month totals for a year
pub async fn yearly_summary(
    State(state): State<Arc<AppState>>,
    Path(year): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<YearlySummary>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let summary = Aggregator::new(&state.db).yearly_summary(owner.id, year)?;

    state.db.log_audit(
        &owner.email,
        "report",
        Some("yearly_summary"),
        None,
        Some(&format!("year={}, months={}", year, summary.months.len())),
    )?;

    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// Start date (YYYY-MM-DD, inclusive)
    pub from: String,
    /// End date (YYYY-MM-DD, inclusive)
    pub to: String,
}

/// GET /api/summary/range?from&to - Category summary over whole days
pub async fn range_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeQuery>,
    headers: HeaderMap,
) -> Result<Json<WindowSummary>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let window = resolve_window(Some(&params.from), Some(&params.to))?
        .ok_or_else(|| AppError::bad_request("from and to are required"))?;
    let summary = Aggregator::new(&state.db).window_summary(owner.id, window)?;

    state.db.log_audit(
        &owner.email,
        "report",
        Some("range_summary"),
        None,
        Some(&format!("from={}, to={}", params.from, params.to)),
    )?;

    Ok(Json(summary))
}

/// GET /api/stats - Lifetime statistics
pub async fn overall_statistics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<OverallStatistics>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let stats = Aggregator::new(&state.db).overall_statistics(owner.id)?;

    state.db.log_audit(
        &owner.email,
        "report",
        Some("statistics"),
        None,
        Some(&format!("count={}", stats.count)),
    )?;

    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

/// GET /api/top?limit - Largest expenses
pub async fn top_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<Expense>>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let limit = params
        .limit
        .unwrap_or(state.config.analytics.default_top_limit)
        .min(MAX_PAGE_LIMIT);
    let top = Aggregator::new(&state.db).top_expenses(owner.id, limit)?;

    state.db.log_audit(
        &owner.email,
        "report",
        Some("top_expenses"),
        None,
        Some(&format!("limit={}, returned={}", limit, top.len())),
    )?;

    Ok(Json(top))
}
