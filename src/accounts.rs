use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use uuid::Uuid;

use crate::auth::CallerId;
use crate::constants::MAX_ACCOUNT_NAME_LENGTH;
use crate::error::{ApiError, db_error_with_context};
use crate::models::{Account, AccountType, CreateAccountPayload};
use crate::utils::{missing_fields, non_blank, now_timestamp, validate_string_length};
use crate::{AppState, Db};

pub fn extract_account_from_row(row: libsql::Row) -> Result<Account, ApiError> {
    let account_type: String = row
        .get(2)
        .map_err(db_error_with_context("invalid account data"))?;

    Ok(Account {
        id: row.get(0).map_err(db_error_with_context("invalid account data"))?,
        name: row.get(1).map_err(db_error_with_context("invalid account data"))?,
        account_type: AccountType::parse(&account_type)
            .ok_or_else(|| ApiError::Internal(format!("unknown account type {}", account_type)))?,
        user_id: row.get(3).map_err(db_error_with_context("invalid account data"))?,
        created_at: row.get(4).map_err(db_error_with_context("invalid account data"))?,
    })
}

pub async fn create_account_for_user(
    db: &Db,
    user_id: &str,
    payload: CreateAccountPayload,
) -> Result<Account, ApiError> {
    let (Some(name), Some(type_text)) = (non_blank(&payload.name), non_blank(&payload.account_type))
    else {
        return Err(missing_fields(&["name", "type"]));
    };

    validate_string_length(name, "Account name", MAX_ACCOUNT_NAME_LENGTH)?;
    let account_type = AccountType::parse(type_text).ok_or_else(|| {
        ApiError::bad_request("Account type must be one of bank, cash, credit, other")
    })?;

    let account = Account {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        account_type,
        user_id: user_id.to_string(),
        created_at: now_timestamp(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO accounts (id, user_id, name, type, created_at) VALUES (?, ?, ?, ?, ?)",
        (
            account.id.as_str(),
            account.user_id.as_str(),
            account.name.as_str(),
            account.account_type.as_str(),
            account.created_at.as_str(),
        ),
    )
    .await
    .map_err(db_error_with_context("account creation failed"))?;

    Ok(account)
}

pub async fn list_accounts_for_user(db: &Db, user_id: &str) -> Result<Vec<Account>, ApiError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, name, type, user_id, created_at FROM accounts WHERE user_id = ? ORDER BY name ASC",
            [user_id],
        )
        .await
        .map_err(db_error_with_context("failed to query accounts"))?;

    let mut accounts = Vec::new();
    while let Some(row) = rows.next().await? {
        accounts.push(extract_account_from_row(row)?);
    }
    Ok(accounts)
}

pub async fn get_accounts(
    State(app_state): State<AppState>,
    caller: CallerId,
) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(
        list_accounts_for_user(&app_state.db, caller.as_str()).await?,
    ))
}

pub async fn create_account(
    State(app_state): State<AppState>,
    caller: CallerId,
    payload: Result<Json<CreateAccountPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let Json(payload) = payload?;
    let account = create_account_for_user(&app_state.db, caller.as_str(), payload).await?;
    Ok((StatusCode::CREATED, Json(account)))
}
