//! Expense ledger commands (add, list, show, update, delete)

use anyhow::{Context, Result};
use spendcast_core::db::Database;
use spendcast_core::models::{parse_timestamp, Expense, ExpenseUpdate, NewExpense, SortOrder};
use spendcast_core::LedgerQuery;

use super::{parse_category, parse_window, truncate};

/// Record an expense, returning its id
pub fn cmd_add(
    db: &Database,
    owner_id: i64,
    amount: f64,
    category: &str,
    date: Option<&str>,
    notes: Option<&str>,
    receipt: Option<&str>,
) -> Result<i64> {
    let new_expense = NewExpense {
        amount,
        category: parse_category(category)?,
        occurred_at: date.map(parse_timestamp).transpose()?,
        notes: notes.map(String::from),
        receipt_reference: receipt.map(String::from),
    };

    let expense = db
        .insert_expense(owner_id, &new_expense)
        .context("Failed to record expense")?;

    println!(
        "✅ Recorded expense #{}: ${:.2} {} on {}",
        expense.id,
        expense.amount,
        expense.category,
        expense.occurred_at.format("%Y-%m-%d")
    );

    Ok(expense.id)
}

pub fn cmd_list(
    db: &Database,
    owner_id: i64,
    category: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    limit: usize,
    offset: usize,
) -> Result<()> {
    let category = category.map(parse_category).transpose()?;
    let window = parse_window(from, to)?;

    let query = LedgerQuery::new()
        .category(category)
        .window(window)
        .order(SortOrder::Desc)
        .limit(Some(limit))
        .offset(offset);
    let expenses = db.list_expenses(owner_id, &query)?;
    let total = db.count_expenses(owner_id, category, window)?;

    if expenses.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    println!(
        "{:>6}  {:10}  {:13}  {:>10}  Notes",
        "ID", "Date", "Category", "Amount"
    );
    println!("{}", "-".repeat(70));
    for expense in &expenses {
        print_row(expense);
    }
    println!();
    println!(
        "Showing {}-{} of {} expenses",
        offset + 1,
        offset + expenses.len(),
        total
    );

    Ok(())
}

fn print_row(expense: &Expense) {
    println!(
        "{:>6}  {:10}  {:13}  {:>10.2}  {}",
        expense.id,
        expense.occurred_at.format("%Y-%m-%d"),
        expense.category.to_string(),
        expense.amount,
        truncate(expense.notes.as_deref().unwrap_or(""), 30)
    );
}

pub fn cmd_show(db: &Database, owner_id: i64, id: i64) -> Result<()> {
    let expense = db
        .get_expense(owner_id, id)?
        .with_context(|| format!("Expense {} not found", id))?;

    println!("🧾 Expense #{}", expense.id);
    println!("   Amount:   ${:.2}", expense.amount);
    println!("   Category: {}", expense.category);
    println!("   Date:     {}", expense.occurred_at.to_rfc3339());
    if let Some(notes) = &expense.notes {
        println!("   Notes:    {}", notes);
    }
    if let Some(receipt) = &expense.receipt_reference {
        println!("   Receipt:  {}", receipt);
    }
    println!("   Recorded: {}", expense.created_at.to_rfc3339());

    Ok(())
}

/// Field changes collected from `spendcast update`
#[derive(Debug, Default)]
pub struct ExpenseEdit {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: Option<String>,
    /// Empty string clears the notes
    pub notes: Option<String>,
    /// Empty string clears the receipt reference
    pub receipt: Option<String>,
}

impl ExpenseEdit {
    fn to_update(&self) -> Result<ExpenseUpdate> {
        let clearable = |value: &Option<String>| {
            value
                .as_ref()
                .map(|v| if v.is_empty() { None } else { Some(v.clone()) })
        };

        Ok(ExpenseUpdate {
            amount: self.amount,
            category: self.category.as_deref().map(parse_category).transpose()?,
            occurred_at: self.date.as_deref().map(parse_timestamp).transpose()?,
            notes: clearable(&self.notes),
            receipt_reference: clearable(&self.receipt),
        })
    }
}

pub fn cmd_update(db: &Database, owner_id: i64, id: i64, edit: &ExpenseEdit) -> Result<()> {
    let update = edit.to_update()?;

    if update.is_empty() {
        anyhow::bail!("Nothing to update. Pass at least one of --amount, --category, --date, --notes, --receipt");
    }

    let expense = db
        .update_expense(owner_id, id, &update)?
        .with_context(|| format!("Expense {} not found", id))?;

    println!("✅ Updated expense #{}", expense.id);
    print_row(&expense);

    Ok(())
}

pub fn cmd_delete(db: &Database, owner_id: i64, id: i64) -> Result<()> {
    if !db.delete_expense(owner_id, id)? {
        anyhow::bail!("Expense {} not found", id);
    }
    println!("🗑️  Deleted expense #{}", id);
    Ok(())
}
