//! Per-user display preferences: currency and whether to show decimals.
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use libsql::Connection;

use crate::auth::CallerId;
use crate::constants::DEFAULT_SHOW_DECIMALS;
use crate::error::{ApiError, db_error_with_context};
use crate::models::{Currency, Settings, UpdateSettingsPayload};
use crate::{AppState, Db};

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: Currency::Usd,
            show_decimals: DEFAULT_SHOW_DECIMALS,
        }
    }
}

/// The stored settings for `user_id`, or the defaults if none were saved.
pub async fn load_settings(db: &Db, user_id: &str) -> Result<Settings, ApiError> {
    let conn = db.read().await;
    read_settings(&conn, user_id).await
}

async fn read_settings(conn: &Connection, user_id: &str) -> Result<Settings, ApiError> {
    let mut rows = conn
        .query(
            "SELECT currency, show_decimals FROM user_settings WHERE user_id = ?",
            [user_id],
        )
        .await
        .map_err(db_error_with_context("failed to query settings"))?;

    let Some(row) = rows.next().await? else {
        return Ok(Settings::default());
    };

    let currency: String = row
        .get(0)
        .map_err(db_error_with_context("invalid settings data"))?;
    Ok(Settings {
        currency: Currency::parse(&currency)
            .ok_or_else(|| ApiError::Internal(format!("unknown stored currency {}", currency)))?,
        show_decimals: row
            .get(1)
            .map_err(db_error_with_context("invalid settings data"))?,
    })
}

pub async fn update_settings_for_user(
    db: &Db,
    user_id: &str,
    payload: UpdateSettingsPayload,
) -> Result<Settings, ApiError> {
    if payload.currency.is_none() && payload.show_decimals.is_none() {
        return Err(ApiError::bad_request(
            "At least one field must be provided for update",
        ));
    }

    let currency = match payload.currency.as_deref() {
        Some(code) => Some(
            Currency::parse(code)
                .ok_or_else(|| ApiError::bad_request("Currency must be one of INR, USD, EUR"))?,
        ),
        None => None,
    };

    // One statement: an absent field binds NULL and keeps the stored value.
    let defaults = Settings::default();
    let conn = db.write().await;
    conn.execute(
        "INSERT INTO user_settings (user_id, currency, show_decimals)
         VALUES (?1, COALESCE(?2, ?4), COALESCE(?3, ?5))
         ON CONFLICT(user_id) DO UPDATE SET
             currency = COALESCE(?2, currency),
             show_decimals = COALESCE(?3, show_decimals)",
        (
            user_id,
            currency.map(|c| c.code()),
            payload.show_decimals,
            defaults.currency.code(),
            defaults.show_decimals,
        ),
    )
    .await
    .map_err(db_error_with_context("failed to save settings"))?;

    read_settings(&conn, user_id).await
}

pub async fn get_settings(
    State(app_state): State<AppState>,
    caller: CallerId,
) -> Result<Json<Settings>, ApiError> {
    Ok(Json(load_settings(&app_state.db, caller.as_str()).await?))
}

pub async fn update_settings(
    State(app_state): State<AppState>,
    caller: CallerId,
    payload: Result<Json<UpdateSettingsPayload>, JsonRejection>,
) -> Result<Json<Settings>, ApiError> {
    let Json(payload) = payload?;
    let settings = update_settings_for_user(&app_state.db, caller.as_str(), payload).await?;
    Ok(Json(settings))
}
