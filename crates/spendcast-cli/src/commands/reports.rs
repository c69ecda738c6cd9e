//! Summary and statistics commands

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use spendcast_core::analytics::Aggregator;
use spendcast_core::db::Database;
use spendcast_core::models::CategorySummary;

use super::{parse_window, truncate};

fn print_categories(categories: &[CategorySummary], grand_total: f64) {
    if categories.is_empty() {
        println!("   No expenses in this period.");
        return;
    }

    println!(
        "   {:13}  {:>10}  {:>6}  {:>10}  {:>6}",
        "Category", "Total", "Count", "Average", "Share"
    );
    println!("   {}", "-".repeat(53));
    for summary in categories {
        let share = if grand_total > 0.0 {
            summary.total / grand_total * 100.0
        } else {
            0.0
        };
        println!(
            "   {:13}  {:>10.2}  {:>6}  {:>10.2}  {:>5.1}%",
            summary.category.to_string(),
            summary.total,
            summary.count,
            summary.average,
            share
        );
    }
    println!("   {}", "-".repeat(53));
    println!("   {:13}  {:>10.2}", "Total", grand_total);
}

/// Summary of one calendar month (defaults to the current month)
pub fn cmd_summary_month(
    db: &Database,
    owner_id: i64,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<()> {
    let today = Utc::now().date_naive();
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());

    let summary = Aggregator::new(db)
        .monthly_summary(owner_id, year, month)
        .context("Failed to summarize month")?;

    println!("📊 Spending for {}-{:02}", summary.year, summary.month);
    println!();
    print_categories(&summary.categories, summary.grand_total);

    Ok(())
}

/// Month-by-month totals for a year (defaults to the current year)
pub fn cmd_summary_year(db: &Database, owner_id: i64, year: Option<i32>) -> Result<()> {
    let year = year.unwrap_or(Utc::now().year());

    let summary = Aggregator::new(db)
        .yearly_summary(owner_id, year)
        .context("Failed to summarize year")?;

    println!("📅 Spending for {}", summary.year);
    println!();
    if summary.months.is_empty() {
        println!("   No expenses in this year.");
        return Ok(());
    }

    let max = summary
        .months
        .iter()
        .map(|m| m.total)
        .fold(0.0_f64, f64::max);
    for bucket in &summary.months {
        let width = if max > 0.0 {
            (bucket.total / max * 30.0).round() as usize
        } else {
            0
        };
        println!(
            "   {}  {:>10.2}  {:>4}  {}",
            bucket.key(),
            bucket.total,
            bucket.count,
            "█".repeat(width)
        );
    }
    println!();
    println!("   Total: ${:.2}", summary.grand_total);

    Ok(())
}

/// Category totals over whole days from `from` through `to`
pub fn cmd_summary_range(db: &Database, owner_id: i64, from: &str, to: &str) -> Result<()> {
    let window = parse_window(Some(from), Some(to))?
        .context("Both --from and --to are required")?;

    let summary = Aggregator::new(db)
        .window_summary(owner_id, window)
        .context("Failed to summarize range")?;

    println!("📊 Spending from {} to {}", from, to);
    println!();
    print_categories(&summary.categories, summary.grand_total);

    Ok(())
}

pub fn cmd_stats(db: &Database, owner_id: i64) -> Result<()> {
    let stats = Aggregator::new(db).overall_statistics(owner_id)?;

    println!("📈 Overall statistics");
    println!();
    if stats.count == 0 {
        println!("   No expenses recorded yet.");
        return Ok(());
    }

    println!("   Expenses: {}", stats.count);
    println!("   Total:    ${:.2}", stats.total);
    println!("   Average:  ${:.2}", stats.average);
    println!("   Smallest: ${:.2}", stats.min);
    println!("   Largest:  ${:.2}", stats.max);
    println!();
    println!("   By category:");
    for entry in &stats.category_breakdown {
        println!(
            "     {:13}  {:>4}  ${:>10.2}",
            entry.category.to_string(),
            entry.count,
            entry.total
        );
    }

    Ok(())
}

pub fn cmd_top(db: &Database, owner_id: i64, limit: usize) -> Result<()> {
    let top = Aggregator::new(db).top_expenses(owner_id, limit)?;

    println!("💸 Top {} expenses", limit);
    println!();
    if top.is_empty() {
        println!("   No expenses recorded yet.");
        return Ok(());
    }

    for (rank, expense) in top.iter().enumerate() {
        println!(
            "   {:>2}. ${:>10.2}  {:13}  {}  {}",
            rank + 1,
            expense.amount,
            expense.category.to_string(),
            expense.occurred_at.format("%Y-%m-%d"),
            truncate(expense.notes.as_deref().unwrap_or(""), 30)
        );
    }

    Ok(())
}
