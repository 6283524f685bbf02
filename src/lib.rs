pub mod accounts;
pub mod auth;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod expenses;
pub mod incomes;
pub mod logging;
pub mod models;
pub mod ownership;
pub mod settings;
pub mod transactions;
pub mod users;
pub mod utils;

use axum::{
    Router,
    routing::{get, post},
};

// Re-export types at crate root for convenient importing
pub use crate::database::{Db, TransactionError, with_transaction};
pub use crate::error::ApiError;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
}

/// The full API surface, shared by the server binary and the integration tests.
pub fn build_router(app_state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/api/me", get(users::me))
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .route(
            "/api/incomes",
            get(incomes::get_incomes)
                .post(incomes::create_income)
                .delete(incomes::delete_income),
        )
        .route(
            "/api/expenses",
            get(expenses::get_expenses)
                .post(expenses::create_expense)
                .delete(expenses::delete_expense),
        )
        .route(
            "/api/transactions",
            get(transactions::get_transactions)
                .post(transactions::create_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/api/accounts",
            post(accounts::create_account).get(accounts::get_accounts),
        )
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .with_state(app_state);

    logging::add_tracing_layer(router)
}

async fn root() -> &'static str {
    "Finance Tracker API"
}
