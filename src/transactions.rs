use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use libsql::{Connection, Value, params::Params};
use uuid::Uuid;

use crate::auth::CallerId;
use crate::constants::*;
use crate::database::with_transaction;
use crate::error::{ApiError, db_error_with_context};
use crate::models::{
    AccountSummary, AccountType, CreateTransactionPayload, DeleteQuery, GetTransactionsQuery,
    GetTransactionsResponse, MessageResponse, Pagination, Transaction, TransactionType,
};
use crate::ownership::{OwnedTable, delete_owned};
use crate::utils::{
    DayBound, format_timestamp, missing_fields, non_blank, now_timestamp, parse_amount,
    parse_date_input, resolve_record_date, validate_description, validate_label,
};
use crate::{AppState, Db};

const REQUIRED_FIELDS: [&str; 4] = ["description", "amount", "type", "accountId"];

const TRANSACTION_COLUMNS: &str = "t.id, t.description, t.amount, t.type, t.category, t.date, t.user_id, t.account_id, t.created_at, a.id, a.name, a.type";

/// Optional exact-match and date-range filters for the transaction listing.
///
/// Blank values are treated as absent and unparseable dates are ignored, so
/// building a filter never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub transaction_type: Option<String>,
    pub account_id: Option<String>,
    pub category: Option<String>,
    /// Inclusive lower bound, already in storage format.
    pub start_date: Option<String>,
    /// Inclusive upper bound, already in storage format.
    pub end_date: Option<String>,
}

impl TransactionFilter {
    pub fn from_query(query: &GetTransactionsQuery) -> Self {
        let date_bound = |value: &Option<String>, bound: DayBound| {
            non_blank(value)
                .and_then(|raw| parse_date_input(raw, bound))
                .map(format_timestamp)
        };

        Self {
            // Stored types are canonical; an unknown value is kept and matches nothing.
            transaction_type: non_blank(&query.transaction_type).map(|raw| {
                TransactionType::parse(raw)
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_else(|| raw.to_string())
            }),
            account_id: non_blank(&query.account_id).map(str::to_string),
            category: non_blank(&query.category).map(str::to_string),
            start_date: date_bound(&query.start_date, DayBound::Start),
            end_date: date_bound(&query.end_date, DayBound::End),
        }
    }

    /// The SQL predicate (over alias `t`) and its positional parameters.
    ///
    /// The owner filter is always first; every present filter is ANDed on.
    pub fn where_clause(&self, user_id: &str) -> (String, Vec<Value>) {
        let mut conditions = vec!["t.user_id = ?"];
        let mut params = vec![Value::Text(user_id.to_string())];

        let optional = [
            ("t.type = ?", &self.transaction_type),
            ("t.account_id = ?", &self.account_id),
            ("t.category = ?", &self.category),
            ("t.date >= ?", &self.start_date),
            ("t.date <= ?", &self.end_date),
        ];
        for (condition, value) in optional {
            if let Some(value) = value {
                conditions.push(condition);
                params.push(Value::Text(value.clone()));
            }
        }

        (conditions.join(" AND "), params)
    }
}

/// Page number and size after defaults and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn from_query(query: &GetTransactionsQuery) -> Self {
        let parse = |value: &Option<String>| non_blank(value).and_then(|v| v.parse::<i64>().ok());

        let page = match parse(&query.page) {
            Some(p) if p >= 1 => p.min(u32::MAX as i64) as u32,
            _ => DEFAULT_PAGE,
        };
        let limit = match parse(&query.limit) {
            Some(l) if l >= 1 => l.min(MAX_TRANSACTIONS_LIMIT as i64) as u32,
            _ => DEFAULT_TRANSACTIONS_LIMIT,
        };

        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

pub fn total_pages(total: u32, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

pub fn extract_transaction_from_row(row: libsql::Row) -> Result<Transaction, ApiError> {
    let invalid = || ApiError::Internal("invalid transaction data".to_string());

    let type_text: String = row
        .get(3)
        .map_err(db_error_with_context("invalid transaction data"))?;
    let account_id: Option<String> = row
        .get(9)
        .map_err(db_error_with_context("invalid transaction data"))?;

    let account = match account_id {
        Some(id) => {
            let account_type: String = row
                .get(11)
                .map_err(db_error_with_context("invalid account data"))?;
            Some(AccountSummary {
                id,
                name: row.get(10).map_err(db_error_with_context("invalid account data"))?,
                account_type: AccountType::parse(&account_type).ok_or_else(invalid)?,
            })
        }
        None => None,
    };

    Ok(Transaction {
        id: row.get(0).map_err(db_error_with_context("invalid transaction data"))?,
        description: row.get(1).map_err(db_error_with_context("invalid transaction data"))?,
        amount: row.get(2).map_err(db_error_with_context("invalid transaction data"))?,
        transaction_type: TransactionType::parse(&type_text).ok_or_else(invalid)?,
        category: row.get(4).map_err(db_error_with_context("invalid transaction data"))?,
        date: row.get(5).map_err(db_error_with_context("invalid transaction data"))?,
        user_id: row.get(6).map_err(db_error_with_context("invalid transaction data"))?,
        account_id: row.get(7).map_err(db_error_with_context("invalid transaction data"))?,
        created_at: row.get(8).map_err(db_error_with_context("invalid transaction data"))?,
        account,
    })
}

async fn count_matching(
    conn: &Connection,
    predicate: &str,
    params: Vec<Value>,
) -> Result<u32, ApiError> {
    let sql = format!("SELECT COUNT(*) FROM transactions t WHERE {}", predicate);
    let mut rows = conn
        .query(&sql, Params::Positional(params))
        .await
        .map_err(db_error_with_context("failed to count transactions"))?;

    match rows.next().await? {
        Some(row) => Ok(row.get(0).map_err(db_error_with_context("invalid count"))?),
        None => Ok(0),
    }
}

async fn fetch_page(
    conn: &Connection,
    predicate: &str,
    mut params: Vec<Value>,
    page: PageRequest,
) -> Result<Vec<Transaction>, ApiError> {
    let sql = format!(
        "SELECT {} FROM transactions t LEFT JOIN accounts a ON a.id = t.account_id WHERE {} ORDER BY t.date DESC, t.created_at DESC LIMIT ? OFFSET ?",
        TRANSACTION_COLUMNS, predicate
    );
    params.push(Value::Integer(page.limit as i64));
    params.push(Value::Integer(page.offset() as i64));

    let mut rows = conn
        .query(&sql, Params::Positional(params))
        .await
        .map_err(db_error_with_context("failed to query transactions"))?;

    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await? {
        transactions.push(extract_transaction_from_row(row)?);
    }
    Ok(transactions)
}

/// One page of the caller's transactions matching `filter`, with the total
/// count over the same predicate.
pub async fn list_transactions_for_user(
    db: &Db,
    user_id: &str,
    filter: &TransactionFilter,
    page: PageRequest,
) -> Result<GetTransactionsResponse, ApiError> {
    let (predicate, params) = filter.where_clause(user_id);
    let conn = db.read().await;

    let (data, total) = tokio::try_join!(
        fetch_page(&conn, &predicate, params.clone(), page),
        count_matching(&conn, &predicate, params),
    )?;

    Ok(GetTransactionsResponse {
        data,
        pagination: Pagination {
            total,
            page: page.page,
            limit: page.limit,
            total_pages: total_pages(total, page.limit),
        },
    })
}

pub async fn create_transaction_for_user(
    db: &Db,
    user_id: &str,
    payload: CreateTransactionPayload,
) -> Result<Transaction, ApiError> {
    let (Some(description), Some(amount), Some(type_text), Some(account_id)) = (
        non_blank(&payload.description),
        payload.amount.as_ref(),
        non_blank(&payload.transaction_type),
        non_blank(&payload.account_id),
    ) else {
        return Err(missing_fields(&REQUIRED_FIELDS));
    };

    validate_description(description)?;
    let amount = parse_amount(amount)?;
    let transaction_type = TransactionType::parse(type_text).ok_or_else(|| {
        ApiError::bad_request("Transaction type must be one of income, expense, transfer")
    })?;
    let category = non_blank(&payload.category).map(str::to_string);
    if let Some(ref category) = category {
        validate_label(category, "Category")?;
    }
    let date = resolve_record_date(payload.date.as_deref())?;

    let transaction = Transaction {
        id: Uuid::new_v4().to_string(),
        description: description.to_string(),
        amount,
        transaction_type,
        category,
        date,
        user_id: user_id.to_string(),
        account_id: account_id.to_string(),
        created_at: now_timestamp(),
        account: None,
    };

    with_transaction::<_, _, ApiError>(db, move |conn| {
        Box::pin(async move {
            let mut account_rows = conn
                .query(
                    "SELECT id, name, type FROM accounts WHERE id = ? AND user_id = ?",
                    (transaction.account_id.as_str(), transaction.user_id.as_str()),
                )
                .await
                .map_err(db_error_with_context("failed to check account"))?;

            let account = match account_rows.next().await? {
                Some(row) => {
                    let account_type: String = row
                        .get(2)
                        .map_err(db_error_with_context("invalid account data"))?;
                    AccountSummary {
                        id: row.get(0).map_err(db_error_with_context("invalid account data"))?,
                        name: row.get(1).map_err(db_error_with_context("invalid account data"))?,
                        account_type: AccountType::parse(&account_type).ok_or_else(|| {
                            ApiError::Internal("invalid account type".to_string())
                        })?,
                    }
                }
                None => return Err(ApiError::bad_request("Account does not exist")),
            };

            conn.execute(
                "INSERT INTO transactions (id, user_id, account_id, description, amount, type, category, date, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                Params::Positional(vec![
                    Value::Text(transaction.id.clone()),
                    Value::Text(transaction.user_id.clone()),
                    Value::Text(transaction.account_id.clone()),
                    Value::Text(transaction.description.clone()),
                    Value::Real(transaction.amount),
                    Value::Text(transaction.transaction_type.as_str().to_string()),
                    transaction
                        .category
                        .clone()
                        .map(Value::Text)
                        .unwrap_or(Value::Null),
                    Value::Text(transaction.date.clone()),
                    Value::Text(transaction.created_at.clone()),
                ]),
            )
            .await
            .map_err(db_error_with_context("transaction creation failed"))?;

            Ok(Transaction {
                account: Some(account),
                ..transaction
            })
        })
    })
    .await
}

pub async fn get_transactions(
    State(app_state): State<AppState>,
    caller: CallerId,
    query: Result<Query<GetTransactionsQuery>, QueryRejection>,
) -> Result<Json<GetTransactionsResponse>, ApiError> {
    // Listing filters never fail: a query string that does not deserialize
    // (e.g. a repeated key) lists unfiltered with default paging.
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!("ignoring unusable transaction query: {}", rejection.body_text());
            GetTransactionsQuery::default()
        }
    };
    let filter = TransactionFilter::from_query(&query);
    let page = PageRequest::from_query(&query);

    let response =
        list_transactions_for_user(&app_state.db, caller.as_str(), &filter, page).await?;
    Ok(Json(response))
}

pub async fn create_transaction(
    State(app_state): State<AppState>,
    caller: CallerId,
    payload: Result<Json<CreateTransactionPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let Json(payload) = payload?;
    let transaction =
        create_transaction_for_user(&app_state.db, caller.as_str(), payload).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn delete_transaction(
    State(app_state): State<AppState>,
    caller: CallerId,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Query(query) = query?;
    let id = non_blank(&query.id)
        .ok_or_else(|| ApiError::bad_request("Transaction ID is required"))?;

    delete_owned(&app_state.db, OwnedTable::Transactions, id, caller.as_str()).await?;

    Ok(Json(MessageResponse {
        message: "Transaction deleted successfully".to_string(),
    }))
}
