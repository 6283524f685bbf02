//! Ownership-checked deletion shared by every user-scoped record kind.
use crate::Db;
use crate::error::{ApiError, db_error_with_context};

/// Tables whose rows are owned through a `user_id` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedTable {
    Incomes,
    Expenses,
    Transactions,
}

impl OwnedTable {
    fn table_name(&self) -> &'static str {
        match self {
            OwnedTable::Incomes => "incomes",
            OwnedTable::Expenses => "expenses",
            OwnedTable::Transactions => "transactions",
        }
    }

    /// Human readable record name used in client messages.
    pub fn noun(&self) -> &'static str {
        match self {
            OwnedTable::Incomes => "Income",
            OwnedTable::Expenses => "Expense",
            OwnedTable::Transactions => "Transaction",
        }
    }
}

/// Delete `id` from `table` only if it is owned by `user_id`.
///
/// The ownership check and the delete are one statement. When nothing was
/// deleted, a follow-up probe tells a missing record (404) apart from one
/// owned by another user (403); that record is left untouched either way.
pub async fn delete_owned(
    db: &Db,
    table: OwnedTable,
    id: &str,
    user_id: &str,
) -> Result<(), ApiError> {
    let conn = db.write().await;

    let delete_sql = format!(
        "DELETE FROM {} WHERE id = ? AND user_id = ?",
        table.table_name()
    );
    let affected_rows = conn
        .execute(&delete_sql, (id, user_id))
        .await
        .map_err(db_error_with_context("failed to delete record"))?;

    if affected_rows > 0 {
        return Ok(());
    }

    let probe_sql = format!("SELECT user_id FROM {} WHERE id = ?", table.table_name());
    let mut rows = conn
        .query(&probe_sql, [id])
        .await
        .map_err(db_error_with_context("failed to look up record"))?;

    match rows.next().await? {
        Some(_) => {
            tracing::warn!(
                "rejected delete of {} {} by non-owner {}",
                table.table_name(),
                id,
                user_id
            );
            Err(ApiError::Forbidden(format!(
                "Not authorized to delete this {}",
                table.noun().to_lowercase()
            )))
        }
        None => Err(ApiError::NotFound(format!("{} not found", table.noun()))),
    }
}
