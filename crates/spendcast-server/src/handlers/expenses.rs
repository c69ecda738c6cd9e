//! Expense ledger handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{parse_category, resolve_window};
use crate::{current_owner, AppError, AppState, SuccessResponse, MAX_PAGE_LIMIT};
use spendcast_core::models::{parse_timestamp, Expense, ExpenseUpdate, NewExpense, SortOrder};
use spendcast_core::LedgerQuery;

/// Query parameters for listing expenses
#[derive(Debug, Deserialize)]
pub struct ExpenseListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    pub category: Option<String>,
    /// Start date (YYYY-MM-DD, inclusive)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD, inclusive)
    pub to: Option<String>,
    /// Sort direction by date (asc or desc)
    #[serde(default = "default_order")]
    pub order: SortOrder,
}

fn default_limit() -> usize {
    50
}

fn default_order() -> SortOrder {
    SortOrder::Desc
}

#[derive(Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
    pub total: i64,
    pub limit: usize,
    pub offset: usize,
}

/// GET /api/expenses - List the caller's expenses
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseListQuery>,
    headers: HeaderMap,
) -> Result<Json<ExpenseListResponse>, AppError> {
    let owner = current_owner(&state, &headers)?;

    // Input validation: clamp pagination parameters
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);
    let category = params.category.as_deref().map(parse_category).transpose()?;
    let window = resolve_window(params.from.as_deref(), params.to.as_deref())?;

    let query = LedgerQuery::new()
        .category(category)
        .window(window)
        .order(params.order)
        .limit(Some(limit))
        .offset(params.offset);
    let expenses = state.db.list_expenses(owner.id, &query)?;
    let total = state.db.count_expenses(owner.id, category, window)?;

    state.db.log_audit(
        &owner.email,
        "list",
        Some("expense"),
        None,
        Some(&format!(
            "limit={}, offset={}, category={:?}, from={:?}, to={:?}, returned={}",
            limit,
            params.offset,
            params.category,
            params.from,
            params.to,
            expenses.len()
        )),
    )?;

    Ok(Json(ExpenseListResponse {
        expenses,
        total,
        limit,
        offset: params.offset,
    }))
}

/// Request body for recording an expense
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub amount: f64,
    pub category: String,
    /// YYYY-MM-DD or RFC 3339; defaults to now
    pub date: Option<String>,
    pub notes: Option<String>,
    pub receipt_reference: Option<String>,
}

/// POST /api/expenses - Record an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let owner = current_owner(&state, &headers)?;

    let new_expense = NewExpense {
        amount: body.amount,
        category: parse_category(&body.category)?,
        occurred_at: body.date.as_deref().map(parse_timestamp).transpose()?,
        notes: body.notes,
        receipt_reference: body.receipt_reference,
    };
    let expense = state.db.insert_expense(owner.id, &new_expense)?;

    state.db.log_audit(
        &owner.email,
        "create",
        Some("expense"),
        Some(expense.id),
        Some(&format!(
            "amount={:.2}, category={}",
            expense.amount, expense.category
        )),
    )?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /api/expenses/:id - Get a single expense
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Expense>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let expense = state
        .db
        .get_expense(owner.id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Expense {} not found", id)))?;

    state
        .db
        .log_audit(&owner.email, "view", Some("expense"), Some(id), None)?;

    Ok(Json(expense))
}

/// PATCH /api/expenses/:id - Partially update an expense
///
/// Only `amount`, `category`, `occurred_at`, `notes` and `receipt_reference`
/// may be sent; any other key is rejected with 400.
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Expense>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let update = ExpenseUpdate::from_json(&body)?;
    let expense = state
        .db
        .update_expense(owner.id, id, &update)?
        .ok_or_else(|| AppError::not_found(&format!("Expense {} not found", id)))?;

    let fields: Vec<&str> = body
        .as_object()
        .map(|obj| obj.keys().map(String::as_str).collect())
        .unwrap_or_default();
    state.db.log_audit(
        &owner.email,
        "update",
        Some("expense"),
        Some(id),
        Some(&format!("fields={}", fields.join(","))),
    )?;

    Ok(Json(expense))
}

/// DELETE /api/expenses/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    let owner = current_owner(&state, &headers)?;

    if !state.db.delete_expense(owner.id, id)? {
        return Err(AppError::not_found(&format!("Expense {} not found", id)));
    }

    state
        .db
        .log_audit(&owner.email, "delete", Some("expense"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
