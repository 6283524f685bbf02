use anyhow::Result;
use libsql::{Builder, Connection};
use std::{future::Future, path::Path, pin::Pin, sync::Arc};
use tokio::sync::RwLock;

use crate::constants::DATABASE_FILE_NAME;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          TEXT    PRIMARY KEY,
    name        TEXT,
    email       TEXT    UNIQUE NOT NULL,
    created_at  TEXT    NOT NULL
);
"#;

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    type        TEXT    NOT NULL,
    created_at  TEXT    NOT NULL
);
"#;

const CREATE_INCOMES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS incomes (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL,
    description TEXT    NOT NULL,
    amount      REAL    NOT NULL,
    source      TEXT    NOT NULL,
    date        TEXT    NOT NULL,
    created_at  TEXT    NOT NULL
);
"#;

const CREATE_EXPENSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL,
    description TEXT    NOT NULL,
    amount      REAL    NOT NULL,
    category    TEXT    NOT NULL,
    date        TEXT    NOT NULL,
    created_at  TEXT    NOT NULL
);
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL,
    account_id  TEXT    NOT NULL,
    description TEXT    NOT NULL,
    amount      REAL    NOT NULL,
    type        TEXT    NOT NULL,
    category    TEXT,
    date        TEXT    NOT NULL,
    created_at  TEXT    NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);
"#;

const CREATE_USER_SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_settings (
    user_id       TEXT    PRIMARY KEY,
    currency      TEXT    NOT NULL,
    show_decimals BOOLEAN NOT NULL DEFAULT TRUE
);
"#;

const CREATE_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id, name);",
    "CREATE INDEX IF NOT EXISTS idx_incomes_user_date ON incomes(user_id, date);",
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date);",
    "CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);",
];

pub type Db = Arc<RwLock<Connection>>;

/// Open (or create) the application database (finance.db) under `data_dir`.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(DATABASE_FILE_NAME);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    create_schema(&conn).await?;
    tracing::debug!("database schema ready in {}", data_dir);

    Ok(Arc::new(RwLock::new(conn)))
}

async fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_USERS_TABLE, ()).await?;
    conn.execute(CREATE_ACCOUNTS_TABLE, ()).await?;
    conn.execute(CREATE_INCOMES_TABLE, ()).await?;
    conn.execute(CREATE_EXPENSES_TABLE, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_TABLE, ()).await?;
    conn.execute(CREATE_USER_SETTINGS_TABLE, ()).await?;
    for statement in CREATE_INDEXES {
        conn.execute(statement, ()).await?;
    }
    Ok(())
}

/// Execute a function within a database transaction, returning handler-compatible errors.
///
/// The write lock is held for the whole transaction, so no other request can
/// interleave statements between BEGIN and COMMIT. The closure must return a
/// boxed future to handle lifetime issues with async closures.
pub async fn with_transaction<F, T, E>(db: &Db, f: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a Connection) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
    E: From<TransactionError>,
{
    let conn = db.write().await;

    conn.execute("BEGIN TRANSACTION", ())
        .await
        .map_err(|_| TransactionError::Begin)?;

    match f(&*conn).await {
        Ok(result) => {
            conn.execute("COMMIT", ())
                .await
                .map_err(|_| TransactionError::Commit)?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_error) = conn.execute("ROLLBACK", ()).await {
                tracing::error!("failed to roll back transaction: {}", rollback_error);
            }
            Err(e)
        }
    }
}

/// Errors that can occur during transaction management
#[derive(Debug)]
pub enum TransactionError {
    Begin,
    Commit,
}

impl From<TransactionError> for crate::error::ApiError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::Begin => {
                crate::error::ApiError::Internal("failed to begin transaction".to_string())
            }
            TransactionError::Commit => {
                crate::error::ApiError::Internal("failed to commit transaction".to_string())
            }
        }
    }
}
