//! Caller identity as attached by the upstream authentication layer.
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::constants::USER_ID_HEADER;
use crate::error::ApiError;

/// The opaque identifier of the user making the request.
///
/// Extracting this in a handler rejects the request with 401 before the
/// handler body runs when the identity header is missing or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

impl CallerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn caller_id_from_parts(parts: &Parts) -> Result<CallerId, ApiError> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| CallerId(value.to_string()))
        .ok_or(ApiError::Unauthorized)
}

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_id_from_parts(parts)
    }
}
