//! CSV export command

use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::db::Database;
use spendcast_core::{export_expenses_csv, LedgerQuery};

use super::{parse_category, parse_window};

/// Write the owner's expenses as CSV to `output`, or stdout when absent
pub fn cmd_export(
    db: &Database,
    owner_id: i64,
    output: Option<&Path>,
    category: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let query = LedgerQuery::new()
        .category(category.map(parse_category).transpose()?)
        .window(parse_window(from, to)?);

    let csv = export_expenses_csv(db, owner_id, &query).context("Failed to export expenses")?;
    let rows = csv.lines().count().saturating_sub(1);

    match output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Exported {} expenses to {}", rows, path.display());
        }
        None => print!("{}", csv),
    }

    Ok(())
}
