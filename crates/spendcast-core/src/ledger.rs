//! Read-only ledger access
//!
//! Every analytics component reads expenses through the [`Ledger`] trait.
//! The owner id is a required argument of every query, so there is no way to
//! ask a ledger for records across owners.
//!
//! Implementations:
//! - [`crate::db::Database`] - SQLite storage
//! - [`MemoryLedger`] - in-process vector, used by tests and embedders

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Category, Expense, SortOrder, TimeWindow};

/// Filters and ordering for a ledger query
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    pub category: Option<Category>,
    pub window: Option<TimeWindow>,
    /// Inclusive lower bound on occurrence date, applied on top of `window`
    pub since: Option<DateTime<Utc>>,
    pub order: SortOrder,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl LedgerQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn window(mut self, window: Option<TimeWindow>) -> Self {
        self.window = window;
        self
    }

    pub fn since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Whether a record passes the category/window filters
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = self.category {
            if expense.category != category {
                return false;
            }
        }
        if let Some(window) = &self.window {
            if !window.contains(&expense.occurred_at) {
                return false;
            }
        }
        if let Some(since) = &self.since {
            if expense.occurred_at < *since {
                return false;
            }
        }
        true
    }
}

/// Query interface over one owner's expenses
pub trait Ledger: Send + Sync {
    /// Expenses of `owner_id` matching `query`, ordered by occurrence date.
    /// No matches is an empty vector, not an error.
    fn query(&self, owner_id: i64, query: &LedgerQuery) -> Result<Vec<Expense>>;

    /// The `limit` largest expenses of `owner_id`, descending by amount
    fn top_by_amount(&self, owner_id: i64, limit: usize) -> Result<Vec<Expense>> {
        if limit == 0 {
            return Ok(vec![]);
        }
        let mut expenses = self.query(owner_id, &LedgerQuery::new().order(SortOrder::Desc))?;
        sort_by_amount_desc(&mut expenses);
        expenses.truncate(limit);
        Ok(expenses)
    }
}

impl<L: Ledger + ?Sized> Ledger for &L {
    fn query(&self, owner_id: i64, query: &LedgerQuery) -> Result<Vec<Expense>> {
        (**self).query(owner_id, query)
    }

    fn top_by_amount(&self, owner_id: i64, limit: usize) -> Result<Vec<Expense>> {
        (**self).top_by_amount(owner_id, limit)
    }
}

/// Descending by amount, most recent first on ties
pub(crate) fn sort_by_amount_desc(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.occurred_at.cmp(&a.occurred_at))
    });
}

/// Ledger backed by an in-memory vector
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    expenses: Vec<Expense>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_expenses(expenses: Vec<Expense>) -> Self {
        Self { expenses }
    }
}

impl Ledger for MemoryLedger {
    fn query(&self, owner_id: i64, query: &LedgerQuery) -> Result<Vec<Expense>> {
        let mut matched: Vec<Expense> = self
            .expenses
            .iter()
            .filter(|e| e.owner_id == owner_id && query.matches(e))
            .cloned()
            .collect();

        // Stable sort keeps insertion order for identical timestamps
        match query.order {
            SortOrder::Asc => matched.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at)),
            SortOrder::Desc => matched.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at)),
        }

        let page = matched.into_iter().skip(query.offset);
        Ok(match query.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_timestamp;

    fn expense(id: i64, owner_id: i64, amount: f64, category: Category, date: &str) -> Expense {
        let ts = parse_timestamp(date).unwrap();
        Expense {
            id,
            owner_id,
            amount,
            category,
            occurred_at: ts,
            notes: None,
            receipt_reference: None,
            created_at: ts,
        }
    }

    fn ledger() -> MemoryLedger {
        MemoryLedger::from_expenses(vec![
            expense(1, 1, 10.0, Category::Food, "2024-03-02"),
            expense(2, 1, 30.0, Category::Travel, "2024-01-15"),
            expense(3, 2, 99.0, Category::Food, "2024-02-01"),
            expense(4, 1, 20.0, Category::Food, "2024-02-10"),
        ])
    }

    #[test]
    fn test_query_is_owner_scoped_and_ordered() {
        let ledger = ledger();
        let asc = ledger.query(1, &LedgerQuery::new()).unwrap();
        assert_eq!(asc.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 4, 1]);

        let desc = ledger
            .query(1, &LedgerQuery::new().order(SortOrder::Desc))
            .unwrap();
        assert_eq!(desc.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 4, 2]);

        assert!(ledger.query(3, &LedgerQuery::new()).unwrap().is_empty());
    }

    #[test]
    fn test_query_filters_and_pagination() {
        let ledger = ledger();
        let food = ledger
            .query(1, &LedgerQuery::new().category(Some(Category::Food)))
            .unwrap();
        assert_eq!(food.len(), 2);

        let feb = TimeWindow::month(2024, 2).unwrap();
        let in_feb = ledger
            .query(1, &LedgerQuery::new().window(Some(feb)))
            .unwrap();
        assert_eq!(in_feb.len(), 1);
        assert_eq!(in_feb[0].id, 4);

        let since = parse_timestamp("2024-02-10").unwrap();
        let recent = ledger
            .query(1, &LedgerQuery::new().since(Some(since)))
            .unwrap();
        assert_eq!(recent.iter().map(|e| e.id).collect::<Vec<_>>(), vec![4, 1]);

        let page = ledger
            .query(1, &LedgerQuery::new().offset(1).limit(Some(1)))
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, 4);
    }

    #[test]
    fn test_top_by_amount() {
        let ledger = ledger();
        let top = ledger.top_by_amount(1, 2).unwrap();
        assert_eq!(top.iter().map(|e| e.amount).collect::<Vec<_>>(), vec![30.0, 20.0]);
        assert!(ledger.top_by_amount(1, 0).unwrap().is_empty());
        assert_eq!(ledger.top_by_amount(1, 50).unwrap().len(), 3);
    }
}
