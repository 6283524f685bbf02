#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fintrack_server::{AppState, build_router, constants::USER_ID_HEADER, database, users};
use serde_json::Value;
use tower::util::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    // Dropping this deletes the database directory.
    _temp_dir: tempfile::TempDir,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let temp_dir = tempfile::tempdir()?;
    let data_path = temp_dir.path().to_string_lossy().to_string();

    let db = database::init_db(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize database: {}", e))?;

    let state = AppState { db };
    let router = build_router(state.clone());

    Ok(TestApp {
        router,
        state,
        _temp_dir: temp_dir,
    })
}

pub async fn create_test_user(app: &TestApp, name: &str) -> anyhow::Result<String> {
    let email = format!("{}@example.com", name);
    let user = users::create_user(&app.state.db, Some(name), &email).await?;
    Ok(user.id)
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8(bytes.to_vec()).expect("utf8 body"))
    })
}

/// Send a request as `user_id` (or anonymously) and return the status and
/// JSON body.
pub async fn api_request(
    app: &TestApp,
    method: &str,
    uri: &str,
    user_id: Option<&str>,
    payload: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    router_request(app.router.clone(), method, uri, user_id, payload).await
}

/// Like [api_request] but takes an owned router, for use from spawned tasks.
pub async fn router_request(
    router: Router,
    method: &str,
    uri: &str,
    user_id: Option<&str>,
    payload: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(USER_ID_HEADER, user_id);
    }

    let body = match payload {
        Some(payload) => {
            builder = builder.header("content-type", "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };

    let request = builder
        .body(body)
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;

    let response = router
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read response body: {}", e))?;

    Ok((status, parse_body(&bytes)))
}

pub async fn create_account(app: &TestApp, user_id: &str, name: &str) -> anyhow::Result<String> {
    let (status, body) = api_request(
        app,
        "POST",
        "/api/accounts",
        Some(user_id),
        Some(serde_json::json!({ "name": name, "type": "bank" })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "account creation failed: {}", body);
    body["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("account id missing"))
}

/// Insert a transaction row directly, bypassing validation, so tests can pick
/// exact dates.
pub async fn insert_transaction(
    app: &TestApp,
    id: &str,
    user_id: &str,
    account_id: &str,
    transaction_type: &str,
    category: Option<&str>,
    date: &str,
) -> anyhow::Result<()> {
    let conn = app.state.db.write().await;
    conn.execute(
        "INSERT INTO transactions (id, user_id, account_id, description, amount, type, category, date, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        libsql::params::Params::Positional(vec![
            libsql::Value::Text(id.to_string()),
            libsql::Value::Text(user_id.to_string()),
            libsql::Value::Text(account_id.to_string()),
            libsql::Value::Text(format!("tx {}", id)),
            libsql::Value::Real(10.0),
            libsql::Value::Text(transaction_type.to_string()),
            category
                .map(|c| libsql::Value::Text(c.to_string()))
                .unwrap_or(libsql::Value::Null),
            libsql::Value::Text(date.to_string()),
            libsql::Value::Text(date.to_string()),
        ]),
    )
    .await?;
    Ok(())
}
