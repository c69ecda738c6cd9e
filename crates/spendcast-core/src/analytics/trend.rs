//! Category spending trend classification
//!
//! A category's recent expenses are bucketed by calendar month. The mean of
//! the last two buckets is compared against the mean of the earlier ones:
//! more than 20% higher is `increasing`, more than 20% lower is `decreasing`.

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use tracing::{debug, warn};

use super::aggregator::monthly_buckets;
use crate::ledger::{Ledger, LedgerQuery};
use crate::models::{Category, Trend, TrendResult, MIN_YEAR};

/// Length of a "month" when converting the lookback to a cutoff date
pub const DAYS_PER_MONTH: i64 = 30;

/// Longest lookback accepted at the CLI and HTTP boundaries
pub const MAX_LOOKBACK_MONTHS: u32 = 120;

const INCREASE_FACTOR: f64 = 1.2;
const DECREASE_FACTOR: f64 = 0.8;

pub struct TrendClassifier<L> {
    ledger: L,
}

impl<L: Ledger> TrendClassifier<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Classify a category over the last `lookback_months`
    pub fn category_trend(&self, owner_id: i64, category: Category, lookback_months: u32) -> TrendResult {
        self.category_trend_at(owner_id, category, lookback_months, Utc::now())
    }

    /// Same as [`Self::category_trend`] with an explicit clock
    pub fn category_trend_at(
        &self,
        owner_id: i64,
        category: Category,
        lookback_months: u32,
        now: DateTime<Utc>,
    ) -> TrendResult {
        // A lookback reaching before the first storable year has no lower bound
        let cutoff = TimeDelta::try_days(i64::from(lookback_months) * DAYS_PER_MONTH)
            .and_then(|span| now.checked_sub_signed(span))
            .filter(|cutoff| cutoff.year() >= MIN_YEAR);
        let query = LedgerQuery::new().category(Some(category)).since(cutoff);

        let expenses = match self.ledger.query(owner_id, &query) {
            Ok(expenses) => expenses,
            Err(e) => {
                warn!(owner_id, %category, error = %e, "Trend query failed");
                return TrendResult {
                    category,
                    trend: Trend::Error,
                    monthly_totals: vec![],
                    months: vec![],
                    total_spent: 0.0,
                    months_analyzed: 0,
                    error: Some(e.to_string()),
                };
            }
        };

        let months = monthly_buckets(&expenses);
        let monthly_totals: Vec<f64> = months.iter().map(|b| b.total).collect();
        let trend = if expenses.is_empty() {
            Trend::NoData
        } else {
            classify(&monthly_totals)
        };
        debug!(owner_id, %category, buckets = months.len(), %trend, "Classified trend");

        TrendResult {
            category,
            trend,
            total_spent: monthly_totals.iter().fold(0.0, |acc, v| acc + v),
            months_analyzed: months.len(),
            monthly_totals,
            months,
            error: None,
        }
    }

    /// Trends of every category
    pub fn all_trends(&self, owner_id: i64, lookback_months: u32) -> Vec<TrendResult> {
        self.all_trends_at(owner_id, lookback_months, Utc::now())
    }

    pub fn all_trends_at(&self, owner_id: i64, lookback_months: u32, now: DateTime<Utc>) -> Vec<TrendResult> {
        Category::all()
            .iter()
            .map(|c| self.category_trend_at(owner_id, *c, lookback_months, now))
            .collect()
    }
}

/// Label a chronological series of bucket totals
pub fn classify(totals: &[f64]) -> Trend {
    match totals.len() {
        0 => Trend::NoData,
        1 => Trend::InsufficientData,
        n => {
            let recent = mean(&totals[n - 2..]);
            let older = if n == 2 {
                totals[0]
            } else {
                mean(&totals[..n - 2])
            };

            if recent > older * INCREASE_FACTOR {
                Trend::Increasing
            } else if recent < older * DECREASE_FACTOR {
                Trend::Decreasing
            } else {
                Trend::Stable
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
