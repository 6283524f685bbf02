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
use crate::models::{CreateIncomePayload, DeleteQuery, Income, MessageResponse};
use crate::ownership::{OwnedTable, delete_owned};
use crate::utils::{
    missing_fields, non_blank, now_timestamp, parse_amount, resolve_record_date,
    validate_description, validate_label,
};
use crate::{AppState, Db};

const REQUIRED_FIELDS: [&str; 3] = ["description", "amount", "source"];

pub fn extract_income_from_row(row: libsql::Row) -> Result<Income, ApiError> {
    Ok(Income {
        id: row.get(0).map_err(db_error_with_context("invalid income data"))?,
        description: row.get(1).map_err(db_error_with_context("invalid income data"))?,
        amount: row.get(2).map_err(db_error_with_context("invalid income data"))?,
        source: row.get(3).map_err(db_error_with_context("invalid income data"))?,
        date: row.get(4).map_err(db_error_with_context("invalid income data"))?,
        user_id: row.get(5).map_err(db_error_with_context("invalid income data"))?,
        created_at: row.get(6).map_err(db_error_with_context("invalid income data"))?,
    })
}

pub async fn create_income_for_user(
    db: &Db,
    user_id: &str,
    payload: CreateIncomePayload,
) -> Result<Income, ApiError> {
    let (Some(description), Some(amount), Some(source)) = (
        non_blank(&payload.description),
        payload.amount.as_ref(),
        non_blank(&payload.source),
    ) else {
        return Err(missing_fields(&REQUIRED_FIELDS));
    };

    validate_description(description)?;
    validate_label(source, "Source")?;
    let amount = parse_amount(amount)?;
    let date = resolve_record_date(payload.date.as_deref())?;

    let income = Income {
        id: Uuid::new_v4().to_string(),
        description: description.to_string(),
        amount,
        source: source.to_string(),
        date,
        user_id: user_id.to_string(),
        created_at: now_timestamp(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO incomes (id, user_id, description, amount, source, date, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            income.id.as_str(),
            income.user_id.as_str(),
            income.description.as_str(),
            income.amount,
            income.source.as_str(),
            income.date.as_str(),
            income.created_at.as_str(),
        ),
    )
    .await
    .map_err(db_error_with_context("income creation failed"))?;

    Ok(income)
}

pub async fn list_incomes_for_user(db: &Db, user_id: &str) -> Result<Vec<Income>, ApiError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, description, amount, source, date, user_id, created_at FROM incomes WHERE user_id = ? ORDER BY date DESC, created_at DESC",
            [user_id],
        )
        .await
        .map_err(db_error_with_context("failed to query incomes"))?;

    let mut incomes = Vec::new();
    while let Some(row) = rows.next().await? {
        incomes.push(extract_income_from_row(row)?);
    }
    Ok(incomes)
}

pub async fn get_incomes(
    State(app_state): State<AppState>,
    caller: CallerId,
) -> Result<Json<Vec<Income>>, ApiError> {
    let incomes = list_incomes_for_user(&app_state.db, caller.as_str()).await?;
    Ok(Json(incomes))
}

pub async fn create_income(
    State(app_state): State<AppState>,
    caller: CallerId,
    payload: Result<Json<CreateIncomePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Income>), ApiError> {
    let Json(payload) = payload?;
    let income = create_income_for_user(&app_state.db, caller.as_str(), payload).await?;
    Ok((StatusCode::CREATED, Json(income)))
}

pub async fn delete_income(
    State(app_state): State<AppState>,
    caller: CallerId,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Query(query) = query?;
    let id = non_blank(&query.id)
        .ok_or_else(|| ApiError::bad_request("Income ID is required"))?;

    delete_owned(&app_state.db, OwnedTable::Incomes, id, caller.as_str()).await?;

    Ok(Json(MessageResponse {
        message: "Income deleted successfully".to_string(),
    }))
}
