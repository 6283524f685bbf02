use fintrack_server::ApiError;
use fintrack_server::dashboard::{dashboard_window, merge_recent_activity, sum_or_zero};
use fintrack_server::models::*;
use fintrack_server::transactions::{PageRequest, TransactionFilter, total_pages};
use fintrack_server::utils::{DayBound, format_timestamp, parse_amount, parse_date_input};
use libsql::Value;
use time::macros::datetime;

fn entry(id: &str, kind: ActivityKind, date: &str) -> ActivityEntry {
    ActivityEntry {
        id: id.to_string(),
        description: id.to_string(),
        amount: 1.0,
        kind,
        date: date.to_string(),
        category: "General".to_string(),
    }
}

fn query() -> GetTransactionsQuery {
    GetTransactionsQuery::default()
}

#[test]
fn merge_interleaves_by_date_and_truncates() {
    let incomes = vec![
        entry("i3", ActivityKind::Income, "2024-01-09T00:00:00Z"),
        entry("i2", ActivityKind::Income, "2024-01-05T00:00:00Z"),
        entry("i1", ActivityKind::Income, "2024-01-01T00:00:00Z"),
    ];
    let expenses = vec![
        entry("e2", ActivityKind::Expense, "2024-01-07T00:00:00Z"),
        entry("e1", ActivityKind::Expense, "2024-01-03T00:00:00Z"),
    ];

    let merged = merge_recent_activity(incomes, expenses, 4);
    let ids: Vec<&str> = merged.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["i3", "e2", "i2", "e1"]);
    assert_eq!(merged[1].kind, ActivityKind::Expense);
}

#[test]
fn merge_when_one_side_dominates() {
    let incomes: Vec<ActivityEntry> = (0..10)
        .map(|d| {
            entry(
                &format!("i{}", d),
                ActivityKind::Income,
                &format!("2024-02-{:02}T00:00:00Z", 20 - d),
            )
        })
        .collect();
    let expenses = vec![entry("old", ActivityKind::Expense, "2023-12-31T00:00:00Z")];

    let merged = merge_recent_activity(incomes, expenses, 10);
    assert_eq!(merged.len(), 10);
    assert!(merged.iter().all(|e| e.kind == ActivityKind::Income));
}

#[test]
fn merge_of_empty_feeds_is_empty() {
    assert!(merge_recent_activity(Vec::new(), Vec::new(), 10).is_empty());
}

#[test]
fn null_sum_becomes_zero() {
    assert_eq!(sum_or_zero(None), 0.0);
    assert_eq!(sum_or_zero(Some(42.5)), 42.5);
}

#[test]
fn dashboard_window_spans_thirty_days() {
    let (start, end) = dashboard_window(datetime!(2024-03-31 15:45:10.75 UTC));
    assert_eq!(start, "2024-03-01T15:45:10Z");
    assert_eq!(end, "2024-03-31T15:45:10Z");
}

#[test]
fn total_pages_rounds_up() {
    assert_eq!(total_pages(0, 10), 0);
    assert_eq!(total_pages(3, 1), 3);
    assert_eq!(total_pages(10, 10), 1);
    assert_eq!(total_pages(11, 10), 2);
}

#[test]
fn page_request_defaults_and_clamps() {
    assert_eq!(
        PageRequest::from_query(&query()),
        PageRequest { page: 1, limit: 10 }
    );

    let q = GetTransactionsQuery {
        page: Some("3".to_string()),
        limit: Some("250".to_string()),
        ..query()
    };
    let page = PageRequest::from_query(&q);
    assert_eq!(page, PageRequest { page: 3, limit: 100 });
    assert_eq!(page.offset(), 200);

    let q = GetTransactionsQuery {
        page: Some("0".to_string()),
        limit: Some("zero".to_string()),
        ..query()
    };
    assert_eq!(
        PageRequest::from_query(&q),
        PageRequest { page: 1, limit: 10 }
    );
}

#[test]
fn filter_always_scopes_to_owner() {
    let filter = TransactionFilter::from_query(&query());
    assert_eq!(filter, TransactionFilter::default());

    let (predicate, params) = filter.where_clause("user-1");
    assert_eq!(predicate, "t.user_id = ?");
    assert_eq!(params, vec![Value::Text("user-1".to_string())]);
}

#[test]
fn filter_ands_every_present_value_and_skips_blanks() {
    let q = GetTransactionsQuery {
        transaction_type: Some("expense".to_string()),
        account_id: Some("   ".to_string()),
        category: Some("Food".to_string()),
        start_date: Some("2024-01-01".to_string()),
        end_date: Some("2024-01-31".to_string()),
        ..query()
    };
    let filter = TransactionFilter::from_query(&q);
    assert_eq!(filter.account_id, None);
    assert_eq!(filter.start_date.as_deref(), Some("2024-01-01T00:00:00Z"));
    assert_eq!(filter.end_date.as_deref(), Some("2024-01-31T23:59:59Z"));

    let (predicate, params) = filter.where_clause("u");
    assert_eq!(
        predicate,
        "t.user_id = ? AND t.type = ? AND t.category = ? AND t.date >= ? AND t.date <= ?"
    );
    assert_eq!(params.len(), 5);
    assert_eq!(params[1], Value::Text("expense".to_string()));
}

#[test]
fn date_input_accepts_rfc3339_and_plain_dates() {
    let parsed = parse_date_input("2024-05-01T10:00:00+02:00", DayBound::Start).unwrap();
    assert_eq!(format_timestamp(parsed), "2024-05-01T08:00:00Z");

    let start = parse_date_input("2024-05-01", DayBound::Start).unwrap();
    assert_eq!(format_timestamp(start), "2024-05-01T00:00:00Z");
    let end = parse_date_input("2024-05-01", DayBound::End).unwrap();
    assert_eq!(format_timestamp(end), "2024-05-01T23:59:59Z");

    assert!(parse_date_input("05/01/2024", DayBound::Start).is_none());
    assert!(parse_date_input("", DayBound::Start).is_none());
}

#[test]
fn amount_coercion() {
    assert_eq!(parse_amount(&AmountInput::Number(12.5)), Ok(12.5));
    assert_eq!(parse_amount(&AmountInput::Text(" 99.90 ".to_string())), Ok(99.9));
    assert!(matches!(
        parse_amount(&AmountInput::Number(0.0)),
        Err(ApiError::BadRequest(_))
    ));
    assert!(matches!(
        parse_amount(&AmountInput::Text("NaN".to_string())),
        Err(ApiError::BadRequest(_))
    ));
    assert!(matches!(
        parse_amount(&AmountInput::Text("ten".to_string())),
        Err(ApiError::BadRequest(_))
    ));
}

#[test]
fn serde_wire_names() {
    let payload: CreateTransactionPayload = serde_json::from_str(
        r#"{"description":"x","amount":"5","type":"transfer","accountId":"acc-1"}"#,
    )
    .unwrap();
    assert_eq!(payload.transaction_type.as_deref(), Some("transfer"));
    assert_eq!(payload.account_id.as_deref(), Some("acc-1"));
    assert_eq!(payload.amount, Some(AmountInput::Text("5".to_string())));

    let summary = DashboardSummary {
        balance: 1.0,
        total_income: 2.0,
        total_expenses: 1.0,
        recent_transactions: vec![],
    };
    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("totalIncome").is_some());
    assert!(json.get("recentTransactions").is_some());
}
