//! Grouped sums, counts and averages over an owner's ledger

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use tracing::debug;

use crate::error::Result;
use crate::ledger::{Ledger, LedgerQuery};
use crate::models::{
    year_month, Category, CategoryBreakdown, CategorySummary, Expense, MonthlyBucket,
    MonthlySummary, OverallStatistics, TimeWindow, WindowSummary, YearlySummary,
};

/// Summary reports computed on demand from a ledger
pub struct Aggregator<L> {
    ledger: L,
}

impl<L: Ledger> Aggregator<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Category totals for one calendar month
    pub fn monthly_summary(&self, owner_id: i64, year: i32, month: u32) -> Result<MonthlySummary> {
        let window = TimeWindow::month(year, month)?;
        let (categories, grand_total) = self.summarize(owner_id, window)?;
        Ok(MonthlySummary {
            year,
            month,
            categories,
            grand_total,
        })
    }

    /// Summary of the month containing `now`
    pub fn current_month_summary(&self, owner_id: i64, now: DateTime<Utc>) -> Result<MonthlySummary> {
        self.monthly_summary(owner_id, now.year(), now.month())
    }

    /// Category totals for an arbitrary window
    pub fn window_summary(&self, owner_id: i64, window: TimeWindow) -> Result<WindowSummary> {
        let (categories, grand_total) = self.summarize(owner_id, window)?;
        Ok(WindowSummary {
            start: window.start,
            end: window.end,
            categories,
            grand_total,
        })
    }

    /// Month-by-month totals of one year; months without expenses are absent
    pub fn yearly_summary(&self, owner_id: i64, year: i32) -> Result<YearlySummary> {
        let window = TimeWindow::year(year)?;
        let expenses = self
            .ledger
            .query(owner_id, &LedgerQuery::new().window(Some(window)))?;

        let months = monthly_buckets(&expenses);
        let grand_total = months.iter().fold(0.0, |acc, b| acc + b.total);
        Ok(YearlySummary {
            year,
            months,
            grand_total,
        })
    }

    /// Count, total, average, min and max over every expense of the owner
    pub fn overall_statistics(&self, owner_id: i64) -> Result<OverallStatistics> {
        let expenses = self.ledger.query(owner_id, &LedgerQuery::new())?;
        if expenses.is_empty() {
            return Ok(OverallStatistics::default());
        }

        let count = expenses.len() as i64;
        let total: f64 = expenses.iter().map(|e| e.amount).sum();
        let min = expenses.iter().map(|e| e.amount).fold(f64::INFINITY, f64::min);
        let max = expenses
            .iter()
            .map(|e| e.amount)
            .fold(f64::NEG_INFINITY, f64::max);

        let category_breakdown = group_by_category(&expenses)
            .into_iter()
            .map(|s| CategoryBreakdown {
                category: s.category,
                count: s.count,
                total: s.total,
            })
            .collect();

        Ok(OverallStatistics {
            count,
            total,
            average: total / count as f64,
            min,
            max,
            category_breakdown,
        })
    }

    /// The `limit` largest expenses, descending by amount
    pub fn top_expenses(&self, owner_id: i64, limit: usize) -> Result<Vec<Expense>> {
        self.ledger.top_by_amount(owner_id, limit)
    }

    fn summarize(&self, owner_id: i64, window: TimeWindow) -> Result<(Vec<CategorySummary>, f64)> {
        let expenses = self
            .ledger
            .query(owner_id, &LedgerQuery::new().window(Some(window)))?;
        debug!(owner_id, records = expenses.len(), "Summarizing window");

        let categories = group_by_category(&expenses);
        let grand_total = categories.iter().fold(0.0, |acc, c| acc + c.total);
        Ok((categories, grand_total))
    }
}

/// Per-category total/count/average, largest total first
pub fn group_by_category(expenses: &[Expense]) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<Category, (f64, i64)> = BTreeMap::new();
    for expense in expenses {
        let entry = groups.entry(expense.category).or_insert((0.0, 0));
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    let mut summaries: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category, (total, count))| CategorySummary {
            category,
            total,
            count,
            average: average(total, count),
        })
        .collect();

    // Stable: equal totals keep category order
    summaries.sort_by(|a, b| b.total.total_cmp(&a.total));
    summaries
}

/// Calendar-month buckets in chronological order
pub fn monthly_buckets(expenses: &[Expense]) -> Vec<MonthlyBucket> {
    let mut buckets: BTreeMap<(i32, u32), (f64, i64)> = BTreeMap::new();
    for expense in expenses {
        let entry = buckets
            .entry(year_month(&expense.occurred_at))
            .or_insert((0.0, 0));
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|((year, month), (total, count))| MonthlyBucket {
            year,
            month,
            total,
            count,
        })
        .collect()
}

fn average(total: f64, count: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ledger::MemoryLedger;
    use crate::models::parse_timestamp;

    fn ledger(rows: &[(i64, f64, Category, &str)]) -> MemoryLedger {
        MemoryLedger::from_expenses(
            rows.iter()
                .enumerate()
                .map(|(i, (owner_id, amount, category, date))| {
                    let ts = parse_timestamp(date).unwrap();
                    Expense {
                        id: i as i64 + 1,
                        owner_id: *owner_id,
                        amount: *amount,
                        category: *category,
                        occurred_at: ts,
                        notes: None,
                        receipt_reference: None,
                        created_at: ts,
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn test_monthly_summary_groups_and_orders() {
        let ledger = ledger(&[
            (1, 10.0, Category::Food, "2024-03-01"),
            (1, 20.0, Category::Food, "2024-03-31T23:59:59Z"),
            (1, 50.0, Category::Travel, "2024-03-15"),
            (1, 99.0, Category::Food, "2024-04-01"),
            (2, 77.0, Category::Food, "2024-03-10"),
        ]);
        let summary = Aggregator::new(&ledger).monthly_summary(1, 2024, 3).unwrap();

        assert_eq!(summary.grand_total, 80.0);
        assert_eq!(summary.categories.len(), 2);
        assert_eq!(summary.categories[0].category, Category::Travel);
        assert_eq!(summary.categories[1].total, 30.0);
        assert_eq!(summary.categories[1].count, 2);
        assert_eq!(summary.categories[1].average, 15.0);
    }

    #[test]
    fn test_empty_month() {
        let ledger = ledger(&[]);
        let summary = Aggregator::new(&ledger).monthly_summary(1, 2024, 3).unwrap();
        assert!(summary.categories.is_empty());
        assert_eq!(summary.grand_total, 0.0);
        assert!(summary.grand_total.is_sign_positive());
    }

    #[test]
    fn test_empty_totals_serialize_as_zero() {
        let ledger = ledger(&[]);
        let aggregator = Aggregator::new(&ledger);

        let monthly = serde_json::to_value(aggregator.monthly_summary(1, 2024, 3).unwrap()).unwrap();
        assert_eq!(monthly["grand_total"].to_string(), "0.0");

        let yearly = aggregator.yearly_summary(1, 2024).unwrap();
        assert!(yearly.grand_total.is_sign_positive());
        let yearly = serde_json::to_value(yearly).unwrap();
        assert_eq!(yearly["grand_total"].to_string(), "0.0");

        let window = TimeWindow::month(2024, 3).unwrap();
        let summary = aggregator.window_summary(1, window).unwrap();
        assert!(summary.grand_total.is_sign_positive());
    }

    #[test]
    fn test_year_outside_storable_range_rejected() {
        let ledger = ledger(&[]);
        let aggregator = Aggregator::new(&ledger);
        assert!(matches!(
            aggregator.yearly_summary(1, 9999),
            Err(Error::InvalidWindow(_))
        ));
        assert!(matches!(
            aggregator.monthly_summary(1, 0, 6),
            Err(Error::InvalidWindow(_))
        ));
        assert!(aggregator.yearly_summary(1, 9998).is_ok());
    }

    #[test]
    fn test_invalid_month_rejected() {
        let ledger = ledger(&[]);
        let aggregator = Aggregator::new(&ledger);
        assert!(matches!(
            aggregator.monthly_summary(1, 2024, 13),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_yearly_summary_skips_empty_months() {
        let ledger = ledger(&[
            (1, 5.0, Category::Food, "2024-01-05"),
            (1, 7.0, Category::Other, "2024-01-20"),
            (1, 42.0, Category::Shopping, "2024-11-02"),
            (1, 1.0, Category::Food, "2025-01-01"),
        ]);
        let yearly = Aggregator::new(&ledger).yearly_summary(1, 2024).unwrap();
        assert_eq!(yearly.months.len(), 2);
        assert_eq!(yearly.months[0].month, 1);
        assert_eq!(yearly.months[0].total, 12.0);
        assert_eq!(yearly.months[0].count, 2);
        assert_eq!(yearly.months[1].month, 11);
        assert_eq!(yearly.grand_total, 54.0);
    }

    #[test]
    fn test_overall_statistics() {
        let ledger = ledger(&[
            (1, 5.0, Category::Food, "2024-01-05"),
            (1, 15.0, Category::Food, "2024-02-05"),
            (1, 40.0, Category::Travel, "2024-03-05"),
        ]);
        let stats = Aggregator::new(&ledger).overall_statistics(1).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.total, 60.0);
        assert_eq!(stats.average, 20.0);
        assert_eq!(stats.min, 5.0);
        assert_eq!(stats.max, 40.0);
        assert_eq!(
            stats.category_breakdown,
            vec![
                CategoryBreakdown {
                    category: Category::Travel,
                    count: 1,
                    total: 40.0
                },
                CategoryBreakdown {
                    category: Category::Food,
                    count: 2,
                    total: 20.0
                },
            ]
        );
    }

    #[test]
    fn test_overall_statistics_empty() {
        let ledger = ledger(&[(2, 5.0, Category::Food, "2024-01-05")]);
        let stats = Aggregator::new(&ledger).overall_statistics(1).unwrap();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.total, 0.0);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
        assert!(stats.category_breakdown.is_empty());
    }

    #[test]
    fn test_window_summary() {
        let ledger = ledger(&[
            (1, 5.0, Category::Food, "2024-01-05"),
            (1, 15.0, Category::Food, "2024-02-05"),
        ]);
        let window = TimeWindow::new(
            parse_timestamp("2024-01-01").unwrap(),
            parse_timestamp("2024-02-01").unwrap(),
        )
        .unwrap();
        let summary = Aggregator::new(&ledger).window_summary(1, window).unwrap();
        assert_eq!(summary.grand_total, 5.0);
        assert_eq!(summary.start, window.start);
    }

    #[test]
    fn test_average_of_empty_group_is_zero() {
        assert_eq!(average(0.0, 0), 0.0);
        assert_eq!(average(9.0, 3), 3.0);
    }
}
