use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;

use crate::auth::CallerId;
use crate::error::{ApiError, db_error_with_context};
use crate::models::{CreateExpensePayload, DeleteQuery, Expense, MessageResponse};
use crate::ownership::{OwnedTable, delete_owned};
use crate::utils::{
    missing_fields, non_blank, now_timestamp, parse_amount, resolve_record_date,
    validate_description, validate_label,
};
use crate::{AppState, Db};

const REQUIRED_FIELDS: [&str; 3] = ["description", "amount", "category"];

pub fn extract_expense_from_row(row: libsql::Row) -> Result<Expense, ApiError> {
    Ok(Expense {
        id: row.get(0).map_err(db_error_with_context("invalid expense data"))?,
        description: row.get(1).map_err(db_error_with_context("invalid expense data"))?,
        amount: row.get(2).map_err(db_error_with_context("invalid expense data"))?,
        category: row.get(3).map_err(db_error_with_context("invalid expense data"))?,
        date: row.get(4).map_err(db_error_with_context("invalid expense data"))?,
        user_id: row.get(5).map_err(db_error_with_context("invalid expense data"))?,
        created_at: row.get(6).map_err(db_error_with_context("invalid expense data"))?,
    })
}

pub async fn create_expense_for_user(
    db: &Db,
    user_id: &str,
    payload: CreateExpensePayload,
) -> Result<Expense, ApiError> {
    let (Some(description), Some(amount), Some(category)) = (
        non_blank(&payload.description),
        payload.amount.as_ref(),
        non_blank(&payload.category),
    ) else {
        return Err(missing_fields(&REQUIRED_FIELDS));
    };

    validate_description(description)?;
    validate_label(category, "Category")?;
    let amount = parse_amount(amount)?;
    let date = resolve_record_date(payload.date.as_deref())?;

    let expense = Expense {
        id: Uuid::new_v4().to_string(),
        description: description.to_string(),
        amount,
        category: category.to_string(),
        date,
        user_id: user_id.to_string(),
        created_at: now_timestamp(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO expenses (id, user_id, description, amount, category, date, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            expense.id.as_str(),
            expense.user_id.as_str(),
            expense.description.as_str(),
            expense.amount,
            expense.category.as_str(),
            expense.date.as_str(),
            expense.created_at.as_str(),
        ),
    )
    .await
    .map_err(db_error_with_context("expense creation failed"))?;

    Ok(expense)
}

/// The caller's expenses, most recently recorded first.
pub async fn list_expenses_for_user(db: &Db, user_id: &str) -> Result<Vec<Expense>, ApiError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, description, amount, category, date, user_id, created_at FROM expenses WHERE user_id = ? ORDER BY created_at DESC, date DESC",
            [user_id],
        )
        .await
        .map_err(db_error_with_context("failed to query expenses"))?;

    let mut expenses = Vec::new();
    while let Some(row) = rows.next().await? {
        expenses.push(extract_expense_from_row(row)?);
    }
    Ok(expenses)
}

pub async fn get_expenses(
    State(app_state): State<AppState>,
    caller: CallerId,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = list_expenses_for_user(&app_state.db, caller.as_str()).await?;
    Ok(Json(expenses))
}

pub async fn create_expense(
    State(app_state): State<AppState>,
    caller: CallerId,
    payload: Result<Json<CreateExpensePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let Json(payload) = payload?;
    let expense = create_expense_for_user(&app_state.db, caller.as_str(), payload).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn delete_expense(
    State(app_state): State<AppState>,
    caller: CallerId,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Query(query) = query?;
    let id = non_blank(&query.id)
        .ok_or_else(|| ApiError::bad_request("Expense ID is required"))?;

    delete_owned(&app_state.db, OwnedTable::Expenses, id, caller.as_str()).await?;

    Ok(Json(MessageResponse {
        message: "Expense deleted successfully".to_string(),
    }))
}
