//! Expense CRUD operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{format_datetime, parse_datetime, Database, ExpenseFilter};
use crate::error::{Error, Result};
use crate::ledger::{Ledger, LedgerQuery};
use crate::models::{Category, Expense, ExpenseUpdate, NewExpense, TimeWindow};

const EXPENSE_COLUMNS: &str =
    "id, owner_id, amount, category, occurred_at, notes, receipt_reference, created_at";

fn row_to_expense(row: &Row) -> rusqlite::Result<Expense> {
    let category: String = row.get(3)?;
    let occurred_at: String = row.get(4)?;
    let created_at: String = row.get(7)?;

    Ok(Expense {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        amount: row.get(2)?,
        category: category.parse::<Category>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(Error::InvalidData(e)),
            )
        })?,
        occurred_at: parse_datetime(&occurred_at)?,
        notes: row.get(5)?,
        receipt_reference: row.get(6)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl Database {
    /// Insert a new expense, defaulting its date to now
    pub fn insert_expense(&self, owner_id: i64, expense: &NewExpense) -> Result<Expense> {
        expense.validate()?;

        let occurred_at = expense.occurred_at.unwrap_or_else(Utc::now);
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO expenses (owner_id, amount, category, occurred_at, notes, receipt_reference)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                owner_id,
                expense.amount,
                expense.category.as_str(),
                format_datetime(&occurred_at),
                expense.notes,
                expense.receipt_reference,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(owner_id, id, category = %expense.category, "Inserted expense");

        self.get_expense(owner_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Expense {}", id)))
    }

    /// Get one of the owner's expenses by id
    pub fn get_expense(&self, owner_id: i64, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!(
                    "SELECT {} FROM expenses WHERE id = ? AND owner_id = ?",
                    EXPENSE_COLUMNS
                ),
                params![id, owner_id],
                row_to_expense,
            )
            .optional()?;
        Ok(expense)
    }

    /// List expenses with filters and pagination
    pub fn list_expenses(&self, owner_id: i64, query: &LedgerQuery) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let filter = ExpenseFilter::from_query(owner_id, query).build();

        let sql = format!(
            "SELECT {} FROM expenses {} {} LIMIT ? OFFSET ?",
            EXPENSE_COLUMNS, filter.where_clause, filter.order_clause
        );

        // SQLite treats a negative LIMIT as "no limit"
        let limit = query.limit.map(|l| l as i64).unwrap_or(-1);
        let mut params = filter.into_params();
        params.push(Box::new(limit));
        params.push(Box::new(query.offset as i64));
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let expenses = stmt
            .query_map(param_refs.as_slice(), row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Count expenses matching optional category and window filters
    pub fn count_expenses(
        &self,
        owner_id: i64,
        category: Option<Category>,
        window: Option<TimeWindow>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        let filter = ExpenseFilter::new(owner_id)
            .category(category)
            .window(window)
            .build();

        let count = conn.query_row(
            &filter.build_count_query(),
            filter.params_refs().as_slice(),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Apply a partial update; `Ok(None)` when the expense does not exist for this owner
    pub fn update_expense(
        &self,
        owner_id: i64,
        id: i64,
        update: &ExpenseUpdate,
    ) -> Result<Option<Expense>> {
        update.validate()?;

        let Some(mut expense) = self.get_expense(owner_id, id)? else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(expense));
        }
        update.apply(&mut expense);

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE expenses
            SET amount = ?, category = ?, occurred_at = ?, notes = ?, receipt_reference = ?
            WHERE id = ? AND owner_id = ?
            "#,
            params![
                expense.amount,
                expense.category.as_str(),
                format_datetime(&expense.occurred_at),
                expense.notes,
                expense.receipt_reference,
                id,
                owner_id,
            ],
        )?;
        debug!(owner_id, id, "Updated expense");

        Ok(Some(expense))
    }

    /// Delete an expense, returning whether a row was removed
    pub fn delete_expense(&self, owner_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM expenses WHERE id = ? AND owner_id = ?",
            params![id, owner_id],
        )?;
        Ok(deleted > 0)
    }
}

impl Ledger for Database {
    fn query(&self, owner_id: i64, query: &LedgerQuery) -> Result<Vec<Expense>> {
        self.list_expenses(owner_id, query)
    }

    fn top_by_amount(&self, owner_id: i64, limit: usize) -> Result<Vec<Expense>> {
        if limit == 0 {
            return Ok(vec![]);
        }
        let conn = self.conn()?;
        let filter = ExpenseFilter::new(owner_id).by_amount(true).build();
        let sql = format!(
            "SELECT {} FROM expenses {} {} LIMIT ?",
            EXPENSE_COLUMNS, filter.where_clause, filter.order_clause
        );

        let mut params = filter.into_params();
        params.push(Box::new(limit as i64));
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let expenses = stmt
            .query_map(param_refs.as_slice(), row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(expenses)
    }
}
