//! The API error type and its conversion into JSON error responses.
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::constants::ERR_INTERNAL;

/// The errors a request handler may return.
///
/// Every variant except [ApiError::Internal] carries a message that is safe to
/// show to the client. Internal errors carry the underlying cause, which is
/// logged and then replaced with a generic message.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ApiError {
    /// No caller identity was attached to the request.
    #[error("unauthorized")]
    Unauthorized,

    /// The request was missing a required field or had an invalid value.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The target exists but belongs to another user.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The target does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An unexpected store or runtime failure.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Unauthorized => crate::constants::ERR_UNAUTHORIZED.to_string(),
            ApiError::BadRequest(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message) => message.clone(),
            ApiError::Internal(_) => ERR_INTERNAL.to_string(),
        }
    }
}

/// Wrap a store error with a short description of what was being attempted.
pub fn db_error_with_context(context: &str) -> impl FnOnce(libsql::Error) -> ApiError + '_ {
    move |error| ApiError::Internal(format!("{}: {}", context, error))
}

impl From<libsql::Error> for ApiError {
    fn from(error: libsql::Error) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref cause) = self {
            tracing::error!("An unexpected error occurred: {}", cause);
        }

        let body = ErrorBody {
            message: self.client_message(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}
