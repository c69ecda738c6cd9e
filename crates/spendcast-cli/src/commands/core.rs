//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `resolve_owner` - Map the `--owner` email to an owner id
//! - `load_config` - Load TOML config with environment overrides
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use spendcast_core::config::AppConfig;
use spendcast_core::db::{Database, DB_KEY_ENV};
use spendcast_core::models::{Category, TimeWindow};
use tracing::debug;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Resolve the owner id for `email`, creating the owner on first use
pub fn resolve_owner(db: &Database, email: &str) -> Result<i64> {
    let owner = db
        .upsert_owner(email)
        .with_context(|| format!("Failed to resolve owner '{}'", email))?;
    Ok(owner.id)
}

/// Load the config file (or built-in defaults) and apply environment overrides
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = AppConfig::load(path).context("Failed to load configuration")?;
    config.apply_env();
    debug!(
        extraction = %config.extraction.backend,
        lookback_months = config.analytics.default_lookback_months,
        "Configuration loaded"
    );
    Ok(config)
}

pub fn parse_category(raw: &str) -> Result<Category> {
    raw.parse().map_err(|e: String| anyhow::anyhow!(e))
}

/// Build a whole-day window from optional `--from`/`--to` dates
pub fn parse_window(from: Option<&str>, to: Option<&str>) -> Result<Option<TimeWindow>> {
    let from = from
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --from date format (use YYYY-MM-DD)")?;
    let to = to
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --to date format (use YYYY-MM-DD)")?;
    Ok(TimeWindow::between(from, to)?)
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool, owner_email: &str) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    let owner = resolve_owner(&db, owner_email)?;
    println!("   Owner: {} (id {})", owner_email, owner);

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED ({})", DB_KEY_ENV);
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Record an expense: spendcast add --amount 12.50 --category food");
    println!("  2. See this month: spendcast summary month");
    println!("  3. Start web UI: spendcast serve");

    Ok(())
}
