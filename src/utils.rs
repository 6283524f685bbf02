use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time,
    format_description::well_known::Rfc3339,
    macros::{format_description, time},
};

use crate::constants::*;
use crate::error::ApiError;
use crate::models::AmountInput;

/// Storage format for every timestamp: UTC, second precision. Fixed width, so
/// lexical order in SQL equals chronological order.
const STORED_TIMESTAMP: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

const DATE_ONLY: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Which end of a day a date-only value stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

pub fn format_timestamp(value: OffsetDateTime) -> String {
    let utc = value
        .to_offset(time::UtcOffset::UTC)
        .replace_nanosecond(0)
        .unwrap_or(value);
    utc.format(STORED_TIMESTAMP)
        .unwrap_or_else(|_| utc.unix_timestamp().to_string())
}

pub fn now_timestamp() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

/// Parse a client-supplied date, either RFC 3339 or `YYYY-MM-DD`.
///
/// A date-only value resolves to the first or last second of that day (UTC)
/// depending on `bound`.
pub fn parse_date_input(value: &str, bound: DayBound) -> Option<OffsetDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(timestamp) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(timestamp);
    }

    let date = Date::parse(value, DATE_ONLY).ok()?;
    let time_of_day = match bound {
        DayBound::Start => Time::MIDNIGHT,
        DayBound::End => time!(23:59:59),
    };
    Some(PrimitiveDateTime::new(date, time_of_day).assume_utc())
}

/// Resolve the date of a new record: the supplied date, or now when absent.
pub fn resolve_record_date(value: Option<&str>) -> Result<String, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(now_timestamp()),
        Some(raw) => parse_date_input(raw, DayBound::Start)
            .map(format_timestamp)
            .ok_or_else(|| ApiError::bad_request(ERR_INVALID_DATE)),
    }
}

/// Coerce a client amount to a number and enforce that it is finite and > 0.
pub fn parse_amount(amount: &AmountInput) -> Result<f64, ApiError> {
    let value = match amount {
        AmountInput::Number(n) => *n,
        AmountInput::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| ApiError::bad_request(ERR_INVALID_AMOUNT))?,
    };

    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::bad_request(ERR_INVALID_AMOUNT));
    }
    Ok(value)
}

/// Return the trimmed value if present and non-blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Fail with the shared "missing fields" message, naming the required set.
pub fn missing_fields(required: &[&str]) -> ApiError {
    ApiError::BadRequest(format!("{}: {}", ERR_MISSING_FIELDS, required.join(", ")))
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} cannot be empty", field_name)));
    }
    if value.chars().count() > max_length {
        return Err(ApiError::BadRequest(format!(
            "{} must be less than {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), ApiError> {
    validate_string_length(description, "Description", MAX_DESCRIPTION_LENGTH)
}

pub fn validate_label(label: &str, field_name: &str) -> Result<(), ApiError> {
    validate_string_length(label, field_name, MAX_LABEL_LENGTH)
}
