//! Ledger export
//!
//! Writes one owner's expenses as CSV (`date,category,amount,notes,receipt_reference`),
//! oldest first.

use crate::error::{Error, Result};
use crate::ledger::{Ledger, LedgerQuery};
use crate::models::SortOrder;

const CSV_HEADER: [&str; 5] = ["date", "category", "amount", "notes", "receipt_reference"];

/// Export the expenses matching `query` to CSV
///
/// Ordering is always ascending by date; pagination in `query` is honoured.
pub fn export_expenses_csv<L: Ledger>(
    ledger: &L,
    owner_id: i64,
    query: &LedgerQuery,
) -> Result<String> {
    let query = query.clone().order(SortOrder::Asc);
    let expenses = ledger.query(owner_id, &query)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for expense in &expenses {
        writer.write_record([
            expense.occurred_at.format("%Y-%m-%d").to_string(),
            expense.category.to_string(),
            format!("{:.2}", expense.amount),
            expense.notes.clone().unwrap_or_default(),
            expense.receipt_reference.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("CSV is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{parse_timestamp, Category, NewExpense};

    #[test]
    fn test_export_csv_escapes_and_orders() {
        let db = Database::in_memory().unwrap();
        let owner = db.upsert_owner("a@example.com").unwrap();
        let other = db.upsert_owner("b@example.com").unwrap();

        db.insert_expense(
            owner.id,
            &NewExpense::new(5.5, Category::Food, parse_timestamp("2024-03-02").unwrap())
                .with_notes("tacos, \"extra\" salsa"),
        )
        .unwrap();
        db.insert_expense(
            owner.id,
            &NewExpense::new(100.0, Category::Travel, parse_timestamp("2024-01-15").unwrap()),
        )
        .unwrap();
        db.insert_expense(
            other.id,
            &NewExpense::new(1.0, Category::Other, parse_timestamp("2024-01-01").unwrap()),
        )
        .unwrap();

        let csv = export_expenses_csv(&db, owner.id, &LedgerQuery::new()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,category,amount,notes,receipt_reference");
        assert_eq!(lines[1], "2024-01-15,travel,100.00,,");
        assert_eq!(lines[2], "2024-03-02,food,5.50,\"tacos, \"\"extra\"\" salsa\",");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_export_empty_ledger_has_header() {
        let db = Database::in_memory().unwrap();
        let owner = db.upsert_owner("a@example.com").unwrap();
        let csv = export_expenses_csv(
            &db,
            owner.id,
            &LedgerQuery::new().category(Some(Category::Food)),
        )
        .unwrap();
        assert_eq!(csv, "date,category,amount,notes,receipt_reference\n");
    }
}
