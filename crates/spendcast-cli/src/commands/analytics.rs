//! Trend and forecast commands

use anyhow::{ensure, Result};
use spendcast_core::analytics::{Forecaster, TrendClassifier, MAX_LOOKBACK_MONTHS};
use spendcast_core::db::Database;
use spendcast_core::models::{ForecastResult, Trend, TrendResult};

use super::parse_category;

fn trend_icon(trend: Trend) -> &'static str {
    match trend {
        Trend::Increasing => "📈",
        Trend::Decreasing => "📉",
        Trend::Stable => "➡️ ",
        Trend::InsufficientData | Trend::NoData => "·",
        Trend::Error => "⚠️ ",
    }
}

fn print_trend(result: &TrendResult) {
    println!(
        "   {} {:13}  {:17}  {:>2} months  ${:>10.2}",
        trend_icon(result.trend),
        result.category.to_string(),
        result.trend.as_str(),
        result.months_analyzed,
        result.total_spent
    );
    if let Some(error) = &result.error {
        println!("      error: {}", error);
    }
}

fn check_lookback(months: u32) -> Result<()> {
    ensure!(
        (1..=MAX_LOOKBACK_MONTHS).contains(&months),
        "--months must be between 1 and {}",
        MAX_LOOKBACK_MONTHS
    );
    Ok(())
}

pub fn cmd_trend(db: &Database, owner_id: i64, category: &str, months: u32) -> Result<()> {
    let category = parse_category(category)?;
    check_lookback(months)?;
    let result = TrendClassifier::new(db).category_trend(owner_id, category, months);

    println!("🔎 {} trend over the last {} months", category, months);
    println!();
    print_trend(&result);

    if !result.months.is_empty() {
        println!();
        for bucket in &result.months {
            println!("      {}  ${:>10.2}", bucket.key(), bucket.total);
        }
    }

    Ok(())
}

pub fn cmd_trends(db: &Database, owner_id: i64, months: u32) -> Result<()> {
    check_lookback(months)?;
    let results = TrendClassifier::new(db).all_trends(owner_id, months);

    println!("🔎 Category trends over the last {} months", months);
    println!();
    for result in &results {
        print_trend(result);
    }

    Ok(())
}

fn print_forecast(result: &ForecastResult) {
    if let Some(error) = &result.error {
        println!(
            "   ⚠️  {:13}  forecast failed: {}",
            result.category.to_string(),
            error
        );
        return;
    }
    if let Some(message) = &result.message {
        println!(
            "   ·  {:13}  {} ({} records)",
            result.category.to_string(),
            message,
            result.data_points
        );
        return;
    }

    let flag = if result.predicted_overspend > 0.0 {
        "🚨"
    } else {
        "✅"
    };
    println!(
        "   {} {:13}  predicted ${:>9.2}  recent avg ${:>9.2}  overspend ${:>9.2}  confidence {:.0}%",
        flag,
        result.category.to_string(),
        result.predicted_amount,
        result.recent_average,
        result.predicted_overspend,
        result.confidence * 100.0
    );
}

/// Forecast one category, or every category when none is given
pub fn cmd_predict(db: &Database, owner_id: i64, category: Option<&str>) -> Result<()> {
    let forecaster = Forecaster::new(db);

    println!("🔮 Overspend forecast for the next 30 days");
    println!();
    match category {
        Some(category) => {
            let category = parse_category(category)?;
            print_forecast(&forecaster.predict_overspend(owner_id, category));
        }
        None => {
            for result in forecaster.predict_all(owner_id) {
                print_forecast(&result);
            }
        }
    }

    Ok(())
}
