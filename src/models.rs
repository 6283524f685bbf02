use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub source: String,
    pub date: String,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: String,
    pub user_id: String,
    pub created_at: String,
}

/// An amount as sent by a client: either a JSON number or a numeric string.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateIncomePayload {
    pub description: Option<String>,
    pub amount: Option<AmountInput>,
    pub source: Option<String>,
    pub date: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateExpensePayload {
    pub description: Option<String>,
    pub amount: Option<AmountInput>,
    pub category: Option<String>,
    pub date: Option<String>,
}

/// `?id=` on the delete endpoints.
#[derive(Deserialize, Debug, Default)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Bank,
    Cash,
    Credit,
    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Bank => "bank",
            AccountType::Cash => "cash",
            AccountType::Credit => "credit",
            AccountType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bank" => Some(AccountType::Bank),
            "cash" => Some(AccountType::Cash),
            "credit" => Some(AccountType::Credit),
            "other" => Some(AccountType::Other),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub user_id: String,
    pub created_at: String,
}

/// The account fields joined into transaction responses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateAccountPayload {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            "transfer" => Some(TransactionType::Transfer),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: Option<String>,
    pub date: String,
    pub user_id: String,
    pub account_id: String,
    pub created_at: String,
    pub account: Option<AccountSummary>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionPayload {
    pub description: Option<String>,
    pub amount: Option<AmountInput>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub account_id: Option<String>,
}

/// Raw listing parameters. Everything is optional and kept as text so that
/// malformed values fall back to defaults instead of rejecting the request.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionsQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub account_id: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u32,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetTransactionsResponse {
    pub data: Vec<Transaction>,
    pub pagination: Pagination,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Income,
    Expense,
}

/// One entry of the dashboard's recent activity feed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub id: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub date: String,
    pub category: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub balance: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub recent_transactions: Vec<ActivityEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INR" => Some(Currency::Inr),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub currency: Currency,
    pub show_decimals: bool,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsPayload {
    pub currency: Option<String>,
    pub show_decimals: Option<bool>,
}
