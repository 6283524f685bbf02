use axum::{Json, extract::State};
use uuid::Uuid;

use crate::auth::CallerId;
use crate::error::{ApiError, db_error_with_context};
use crate::models::User;
use crate::utils::now_timestamp;
use crate::{AppState, Db};

/// Provision a user row. Called by the external authentication layer and by
/// test fixtures; there is no HTTP route for it.
pub async fn create_user(db: &Db, name: Option<&str>, email: &str) -> anyhow::Result<User> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.map(str::to_string),
        email: email.trim().to_string(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO users (id, name, email, created_at) VALUES (?, ?, ?, ?)",
        (
            user.id.as_str(),
            user.name.as_deref(),
            user.email.as_str(),
            now_timestamp(),
        ),
    )
    .await?;

    Ok(user)
}

pub async fn find_user(db: &Db, user_id: &str) -> Result<Option<User>, ApiError> {
    let conn = db.read().await;
    let mut rows = conn
        .query("SELECT id, name, email FROM users WHERE id = ?", [user_id])
        .await
        .map_err(db_error_with_context("failed to query user"))?;

    match rows.next().await? {
        Some(row) => Ok(Some(User {
            id: row.get(0).map_err(db_error_with_context("invalid user data"))?,
            name: row.get(1).map_err(db_error_with_context("invalid user data"))?,
            email: row.get(2).map_err(db_error_with_context("invalid user data"))?,
        })),
        None => Ok(None),
    }
}

pub async fn me(
    State(app_state): State<AppState>,
    caller: CallerId,
) -> Result<Json<User>, ApiError> {
    find_user(&app_state.db, caller.as_str())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}
