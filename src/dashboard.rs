//! Dashboard aggregation: trailing-window totals and the recent activity feed.
use axum::{Json, extract::State};
use libsql::Connection;
use time::{Duration, OffsetDateTime};

use crate::auth::CallerId;
use crate::constants::{DASHBOARD_WINDOW_DAYS, RECENT_ACTIVITY_LIMIT};
use crate::error::{ApiError, db_error_with_context};
use crate::models::{ActivityEntry, ActivityKind, DashboardSummary};
use crate::utils::format_timestamp;
use crate::{AppState, Db};

fn ledger_table(kind: ActivityKind) -> (&'static str, &'static str) {
    match kind {
        ActivityKind::Income => ("incomes", "source"),
        ActivityKind::Expense => ("expenses", "category"),
    }
}

/// The inclusive `[now - 30 days, now]` window as stored timestamps.
pub fn dashboard_window(now: OffsetDateTime) -> (String, String) {
    let start = now - Duration::days(DASHBOARD_WINDOW_DAYS);
    (format_timestamp(start), format_timestamp(now))
}

/// SUM over zero rows is NULL; treat it as nothing earned or spent.
pub fn sum_or_zero(sum: Option<f64>) -> f64 {
    sum.unwrap_or(0.0)
}

/// Merge two newest-first feeds into one, newest first, keeping at most `limit`.
///
/// Each input only needs its own newest `limit` entries: no more than `limit`
/// entries of the merged result can come from either side.
pub fn merge_recent_activity(
    incomes: Vec<ActivityEntry>,
    expenses: Vec<ActivityEntry>,
    limit: usize,
) -> Vec<ActivityEntry> {
    let mut merged: Vec<ActivityEntry> = incomes.into_iter().chain(expenses).collect();
    merged.sort_by(|a, b| b.date.cmp(&a.date));
    merged.truncate(limit);
    merged
}

async fn sum_in_window(
    conn: &Connection,
    kind: ActivityKind,
    user_id: &str,
    start: &str,
    end: &str,
) -> Result<f64, ApiError> {
    let (table, _) = ledger_table(kind);
    let sql = format!(
        "SELECT SUM(amount) FROM {} WHERE user_id = ? AND date >= ? AND date <= ?",
        table
    );
    let mut rows = conn
        .query(&sql, (user_id, start, end))
        .await
        .map_err(db_error_with_context("failed to aggregate amounts"))?;

    let sum = match rows.next().await? {
        Some(row) => row
            .get::<Option<f64>>(0)
            .map_err(db_error_with_context("invalid aggregate"))?,
        None => None,
    };
    Ok(sum_or_zero(sum))
}

async fn recent_entries(
    conn: &Connection,
    kind: ActivityKind,
    user_id: &str,
    limit: usize,
) -> Result<Vec<ActivityEntry>, ApiError> {
    let (table, label_column) = ledger_table(kind);
    let sql = format!(
        "SELECT id, description, amount, date, {} FROM {} WHERE user_id = ? ORDER BY date DESC, created_at DESC LIMIT ?",
        label_column, table
    );
    let mut rows = conn
        .query(&sql, (user_id, limit as i64))
        .await
        .map_err(db_error_with_context("failed to query recent activity"))?;

    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push(ActivityEntry {
            id: row.get(0).map_err(db_error_with_context("invalid activity data"))?,
            description: row.get(1).map_err(db_error_with_context("invalid activity data"))?,
            amount: row.get(2).map_err(db_error_with_context("invalid activity data"))?,
            kind,
            date: row.get(3).map_err(db_error_with_context("invalid activity data"))?,
            category: row.get(4).map_err(db_error_with_context("invalid activity data"))?,
        });
    }
    Ok(entries)
}

/// Build the dashboard for `user_id` as of `now`.
pub async fn summarize_for_user(
    db: &Db,
    user_id: &str,
    now: OffsetDateTime,
) -> Result<DashboardSummary, ApiError> {
    let (start, end) = dashboard_window(now);
    let conn = db.read().await;

    let total_income = sum_in_window(&conn, ActivityKind::Income, user_id, &start, &end).await?;
    let total_expenses =
        sum_in_window(&conn, ActivityKind::Expense, user_id, &start, &end).await?;

    // The feed is not limited to the window.
    let incomes = recent_entries(&conn, ActivityKind::Income, user_id, RECENT_ACTIVITY_LIMIT).await?;
    let expenses =
        recent_entries(&conn, ActivityKind::Expense, user_id, RECENT_ACTIVITY_LIMIT).await?;

    Ok(DashboardSummary {
        balance: total_income - total_expenses,
        total_income,
        total_expenses,
        recent_transactions: merge_recent_activity(incomes, expenses, RECENT_ACTIVITY_LIMIT),
    })
}

pub async fn get_dashboard(
    State(app_state): State<AppState>,
    caller: CallerId,
) -> Result<Json<DashboardSummary>, ApiError> {
    let summary =
        summarize_for_user(&app_state.db, caller.as_str(), OffsetDateTime::now_utc()).await?;
    Ok(Json(summary))
}
