//! Expense filter builder for constructing dynamic SQL queries
//!
//! Shared by the ledger query, the paged listing and the count query so
//! their WHERE clauses can never drift apart.

use chrono::{DateTime, Utc};

use crate::ledger::LedgerQuery;
use crate::models::{Category, SortOrder, TimeWindow};

use super::format_datetime;

/// Builder for constructing expense query filters
///
/// The owner is mandatory: there is no way to build a filter that spans owners.
pub struct ExpenseFilter {
    owner_id: i64,
    category: Option<Category>,
    window: Option<TimeWindow>,
    since: Option<DateTime<Utc>>,
    order: SortOrder,
    by_amount: bool,
}

/// Result of building a filter - contains SQL components and parameters
pub struct FilterResult {
    /// WHERE clause including "WHERE" keyword
    pub where_clause: String,
    /// ORDER BY clause including "ORDER BY" keyword
    pub order_clause: String,
    /// Parameters for the query (boxed for rusqlite compatibility)
    pub params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl ExpenseFilter {
    pub fn new(owner_id: i64) -> Self {
        Self {
            owner_id,
            category: None,
            window: None,
            since: None,
            order: SortOrder::Asc,
            by_amount: false,
        }
    }

    /// Filter built from a ledger query (pagination is applied by the caller)
    pub fn from_query(owner_id: i64, query: &LedgerQuery) -> Self {
        Self::new(owner_id)
            .category(query.category)
            .window(query.window)
            .since(query.since)
            .order(query.order)
    }

    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    /// Restrict to `[start, end)`
    pub fn window(mut self, window: Option<TimeWindow>) -> Self {
        self.window = window;
        self
    }

    /// Restrict to `occurred_at >= since`
    pub fn since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Order by amount (descending) instead of occurrence date
    pub fn by_amount(mut self, value: bool) -> Self {
        self.by_amount = value;
        self
    }

    /// Build the filter components
    pub fn build(self) -> FilterResult {
        let mut conditions = vec!["owner_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(self.owner_id)];

        if let Some(category) = self.category {
            conditions.push("category = ?".to_string());
            params.push(Box::new(category.as_str()));
        }

        if let Some(window) = self.window {
            conditions.push("occurred_at >= ? AND occurred_at < ?".to_string());
            params.push(Box::new(format_datetime(&window.start)));
            params.push(Box::new(format_datetime(&window.end)));
        }

        if let Some(since) = self.since {
            conditions.push("occurred_at >= ?".to_string());
            params.push(Box::new(format_datetime(&since)));
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        let order_clause = if self.by_amount {
            "ORDER BY amount DESC, occurred_at DESC, id DESC".to_string()
        } else {
            let dir = self.order.as_sql();
            format!("ORDER BY occurred_at {}, id {}", dir, dir)
        };

        FilterResult {
            where_clause,
            order_clause,
            params,
        }
    }
}

impl FilterResult {
    /// Build a COUNT query
    pub fn build_count_query(&self) -> String {
        format!("SELECT COUNT(*) FROM expenses {}", self.where_clause)
    }

    /// Get parameter references for query execution
    pub fn params_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }

    /// Get mutable parameter vector to append pagination params
    pub fn into_params(self) -> Vec<Box<dyn rusqlite::ToSql>> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_always_filtered() {
        let filter = ExpenseFilter::new(7).build();
        assert_eq!(filter.where_clause, "WHERE owner_id = ?");
        assert_eq!(filter.params.len(), 1);
        assert_eq!(filter.order_clause, "ORDER BY occurred_at ASC, id ASC");
    }

    #[test]
    fn test_category_and_window() {
        let window = TimeWindow::month(2024, 3).unwrap();
        let filter = ExpenseFilter::new(1)
            .category(Some(Category::Food))
            .window(Some(window))
            .order(SortOrder::Desc)
            .build();
        assert!(filter.where_clause.contains("category = ?"));
        assert!(filter
            .where_clause
            .contains("occurred_at >= ? AND occurred_at < ?"));
        assert_eq!(filter.params.len(), 4);
        assert!(filter.order_clause.contains("DESC"));
        assert_eq!(
            filter.build_count_query(),
            format!("SELECT COUNT(*) FROM expenses {}", filter.where_clause)
        );
    }

    #[test]
    fn test_amount_ordering() {
        let filter = ExpenseFilter::new(1).by_amount(true).build();
        assert!(filter.order_clause.starts_with("ORDER BY amount DESC"));
    }
}
