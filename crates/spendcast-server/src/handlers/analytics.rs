//! Trend and forecast handlers
//!
//! Both endpoints always answer 200 once the category parses: insufficient
//! history and model failures are reported inside the result body.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use super::parse_category;
use crate::{current_owner, AppError, AppState};
use spendcast_core::analytics::{Forecaster, TrendClassifier, MAX_LOOKBACK_MONTHS};
use spendcast_core::models::{ForecastResult, TrendResult};

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub months: Option<u32>,
}

impl TrendQuery {
    fn lookback(&self, state: &AppState) -> Result<u32, AppError> {
        let months = self
            .months
            .unwrap_or(state.config.analytics.default_lookback_months);
        if months == 0 || months > MAX_LOOKBACK_MONTHS {
            return Err(AppError::bad_request(&format!(
                "months must be between 1 and {}",
                MAX_LOOKBACK_MONTHS
            )));
        }
        Ok(months)
    }
}

/// GET /api/trends/:category?months - Trend of one category
pub async fn category_trend(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<TrendQuery>,
    headers: HeaderMap,
) -> Result<Json<TrendResult>, AppError> {
    let owner = current_owner(&state, &headers)?;
    let category = parse_category(&category)?;
    let months = params.lookback(&state)?;

    let result = TrendClassifier::new(&state.db).category_trend(owner.id, category, months);

    state.db.log_audit(
        &owner.email,
        "analyze",
        Some("trend"),
        None,
        Some(&format!(
            "category={}, months={}, trend={}",
            category, months, result.trend
        )),
    )?;

    Ok(Json(result))
}

/// GET /api/trends?months - Trends of every category
pub async fn all_trends(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<TrendResult>>, AppError> {
    let owner = current_owner(&state, &headers)?;
    let months = params.lookback(&state)?;

    let results = TrendClassifier::new(&state.db).all_trends(owner.id, months);

    state.db.log_audit(
        &owner.email,
        "analyze",
        Some("trend"),
        None,
        Some(&format!("category=all, months={}", months)),
    )?;

    Ok(Json(results))
}

/// POST /api/predict/:category - Overspend forecast for one category
pub async fn predict_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ForecastResult>, AppError> {
    let owner = current_owner(&state, &headers)?;
    let category = parse_category(&category)?;

    let result = Forecaster::new(&state.db).predict_overspend(owner.id, category);

    state.db.log_audit(
        &owner.email,
        "predict",
        Some("forecast"),
        None,
        Some(&format!(
            "category={}, data_points={}, confidence={}",
            category, result.data_points, result.confidence
        )),
    )?;

    Ok(Json(result))
}

/// POST /api/predict - Overspend forecasts for every category
pub async fn predict_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ForecastResult>>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let results = Forecaster::new(&state.db).predict_all(owner.id);

    state.db.log_audit(
        &owner.email,
        "predict",
        Some("forecast"),
        None,
        Some("category=all"),
    )?;

    Ok(Json(results))
}
