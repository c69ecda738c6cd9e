//! Next-period overspend forecast per category
//!
//! Each expense becomes a training row `(calendar month, days since first
//! expense, amount)` with the amount as target. The fitted model is asked
//! about a synthetic record 30 days after the last one whose amount is the
//! mean of the last three; the overspend is how far that prediction exceeds
//! the recent average.

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::{debug, warn};

use super::regression::{OrdinaryLeastSquares, Regressor};
use crate::error::{Error, Result};
use crate::ledger::{Ledger, LedgerQuery};
use crate::models::{Category, Expense, ForecastResult};

/// Fewer records than this yield an "insufficient data" result
pub const MIN_DATA_POINTS: usize = 3;

/// Number of most recent records averaged for the baseline
const RECENT_WINDOW: usize = 3;

/// Offset of the forecast period from the last record
const FORECAST_HORIZON_DAYS: i64 = 30;

pub struct Forecaster<L> {
    ledger: L,
    regressor: Box<dyn Regressor>,
}

impl<L: Ledger> Forecaster<L> {
    /// Forecaster using ordinary least squares
    pub fn new(ledger: L) -> Self {
        Self::with_regressor(ledger, Box::new(OrdinaryLeastSquares))
    }

    pub fn with_regressor(ledger: L, regressor: Box<dyn Regressor>) -> Self {
        Self { ledger, regressor }
    }

    /// Predict next-period spending for a category; failures are reported in the result
    pub fn predict_overspend(&self, owner_id: i64, category: Category) -> ForecastResult {
        match self.forecast(owner_id, category) {
            Ok(result) => result,
            Err(e) => {
                warn!(owner_id, %category, error = %e, "Forecast failed");
                ForecastResult::failed(category, &e.to_string())
            }
        }
    }

    /// Forecasts for every category
    pub fn predict_all(&self, owner_id: i64) -> Vec<ForecastResult> {
        Category::all()
            .iter()
            .map(|c| self.predict_overspend(owner_id, *c))
            .collect()
    }

    fn forecast(&self, owner_id: i64, category: Category) -> Result<ForecastResult> {
        let history = self
            .ledger
            .query(owner_id, &LedgerQuery::new().category(Some(category)))?;

        let n = history.len();
        if n < MIN_DATA_POINTS {
            return Ok(ForecastResult::insufficient(category, n));
        }

        let first = history[0].occurred_at;
        let x: Vec<Vec<f64>> = history.iter().map(|e| features(e, first)).collect();
        let y: Vec<f64> = history.iter().map(|e| e.amount).collect();

        let model = self.regressor.fit(&x, &y)?;

        let recent_average = mean(&y[n.saturating_sub(RECENT_WINDOW)..]);
        let next_date = history[n - 1].occurred_at + Duration::days(FORECAST_HORIZON_DAYS);
        let next_row = vec![
            next_date.month() as f64,
            (next_date - first).num_days() as f64,
            recent_average,
        ];

        let raw_prediction = model.predict(&next_row);
        let score = model.score(&x, &y);
        if !raw_prediction.is_finite() {
            return Err(Error::Computation(format!(
                "{} produced a non-finite prediction",
                self.regressor.name()
            )));
        }

        let predicted_amount = raw_prediction.max(0.0);
        let predicted_overspend = (predicted_amount - recent_average).max(0.0);
        let confidence = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };

        debug!(
            owner_id,
            %category,
            regressor = self.regressor.name(),
            data_points = n,
            predicted_amount,
            r2 = score,
            "Fitted forecast"
        );

        Ok(ForecastResult {
            category,
            predicted_overspend: round_to(predicted_overspend, 2),
            confidence: round_to(confidence, 3),
            data_points: n,
            predicted_amount: round_to(predicted_amount, 2),
            recent_average: round_to(recent_average, 2),
            message: None,
            error: None,
        })
    }
}

/// `(calendar month, days since first expense, amount)`
fn features(expense: &Expense, first: DateTime<Utc>) -> Vec<f64> {
    vec![
        expense.occurred_at.month() as f64,
        (expense.occurred_at - first).num_days() as f64,
        expense.amount,
    ]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
