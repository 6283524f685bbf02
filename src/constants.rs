// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3001";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DATABASE_FILE_NAME: &str = "finance.db";

// Caller identity, set by the upstream authentication layer
pub const USER_ID_HEADER: &str = "x-user-id";

// Dashboard
pub const DASHBOARD_WINDOW_DAYS: i64 = 30;
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

// Transaction listing
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_TRANSACTIONS_LIMIT: u32 = 10;
pub const MAX_TRANSACTIONS_LIMIT: u32 = 100;

// Validation limits
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_LABEL_LENGTH: usize = 100;
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 100;

// Settings defaults
pub const DEFAULT_SHOW_DECIMALS: bool = true;

// Error messages
pub const ERR_UNAUTHORIZED: &str = "Unauthorized";
pub const ERR_MISSING_FIELDS: &str = "Missing required fields";
pub const ERR_INVALID_AMOUNT: &str = "Amount must be a positive number";
pub const ERR_INVALID_DATE: &str = "Invalid date format";
pub const ERR_INTERNAL: &str = "Internal server error";
