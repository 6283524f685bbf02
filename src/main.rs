use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

// The server binary is a thin shell over the library crate
use fintrack_server::{
    AppState, build_router, config::Config, constants::USER_ID_HEADER, database, logging,
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env().map_err(|e| format!("Configuration error: {:#}", e))?;

    logging::init_logging(&config.log_filter);

    let db = database::init_db(&config.data_path)
        .await
        .map_err(|e| format!("Failed to initialize database: {:#}", e))?;

    let app_state = AppState { db };

    // Configure CORS to allow frontend requests
    let frontend_origin_header = config
        .frontend_origin
        .parse::<HeaderValue>()
        .map_err(|e| format!("Invalid FRONTEND_ORIGIN '{}': {}", config.frontend_origin, e))?;

    let cors = CorsLayer::new()
        .allow_origin(frontend_origin_header)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(USER_ID_HEADER),
        ]);

    let app = build_router(app_state).layer(cors);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", bind_address, e))?;

    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
