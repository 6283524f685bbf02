mod common;

use common::{create_account, create_test_user, setup_test_app};
use fintrack_server::{ApiError, with_transaction};

async fn count_accounts(app: &common::TestApp, user_id: &str) -> anyhow::Result<u32> {
    let conn = app.state.db.read().await;
    let mut rows = conn
        .query("SELECT COUNT(*) FROM accounts WHERE user_id = ?", [user_id])
        .await?;
    let row = rows
        .next()
        .await?
        .ok_or_else(|| anyhow::anyhow!("count row missing"))?;
    Ok(row.get(0)?)
}

#[tokio::test]
async fn test_failed_closure_rolls_back_its_writes() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let user_id = create_test_user(&app, "alice").await?;
    create_account(&app, &user_id, "Checking").await?;

    let owner = user_id.clone();
    let result = with_transaction::<_, (), ApiError>(&app.state.db, move |conn| {
        Box::pin(async move {
            conn.execute(
                "INSERT INTO accounts (id, user_id, name, type, created_at) VALUES (?, ?, ?, ?, ?)",
                ("acc-tmp", owner.as_str(), "Temp", "cash", "2024-01-01T00:00:00Z"),
            )
            .await?;
            Err(ApiError::bad_request("abort"))
        })
    })
    .await;

    assert_eq!(result, Err(ApiError::bad_request("abort")));
    assert_eq!(count_accounts(&app, &user_id).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_failed_rollback_still_returns_closure_error() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let user_id = create_test_user(&app, "alice").await?;

    // Ending the transaction inside the closure makes the ROLLBACK fail.
    let owner = user_id.clone();
    let result = with_transaction::<_, (), ApiError>(&app.state.db, move |conn| {
        Box::pin(async move {
            conn.execute(
                "INSERT INTO accounts (id, user_id, name, type, created_at) VALUES (?, ?, ?, ?, ?)",
                ("acc-kept", owner.as_str(), "Kept", "bank", "2024-01-01T00:00:00Z"),
            )
            .await?;
            conn.execute("COMMIT", ()).await?;
            Err(ApiError::NotFound("gone".to_string()))
        })
    })
    .await;

    assert_eq!(result, Err(ApiError::NotFound("gone".to_string())));
    assert_eq!(count_accounts(&app, &user_id).await?, 1);

    // The connection is usable afterwards
    create_account(&app, &user_id, "Savings").await?;
    assert_eq!(count_accounts(&app, &user_id).await?, 2);

    Ok(())
}
