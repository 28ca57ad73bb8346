//! Shared validation helpers for inbound HTTP adapters.
//!
//! Handlers parse request payloads into domain types through these helpers
//! so every validation failure carries the same `{field, code}` details
//! shape.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{EmailAddress, Error, EventId, UserId};

/// Validation error codes attached to HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidValue,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// A required payload field was absent.
pub(crate) fn missing_field_error(field: &'static str) -> Error {
    Error::invalid_request(format!("{field} is required")).with_details(json!({
        "field": field,
        "code": ValidationCode::MissingField.as_str(),
    }))
}

/// A field carried a value outside its accepted set.
pub(crate) fn invalid_value_error(
    field: &'static str,
    value: impl Into<String>,
    message: impl Into<String>,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "value": value.into(),
        "code": ValidationCode::InvalidValue.as_str(),
    }))
}

fn invalid_uuid_error(field: &'static str, value: &str) -> Error {
    Error::invalid_request(format!("{field} must be a UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": ValidationCode::InvalidUuid.as_str(),
    }))
}

/// Parse a user id path or payload value.
pub(crate) fn parse_user_id(field: &'static str, value: &str) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Parse an event id path or payload value.
pub(crate) fn parse_event_id(field: &'static str, value: &str) -> Result<EventId, Error> {
    EventId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Parse an RFC 3339 timestamp into UTC.
pub(crate) fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| {
            Error::invalid_request(format!("{field} must be an RFC 3339 timestamp")).with_details(
                json!({
                    "field": field,
                    "value": value,
                    "code": ValidationCode::InvalidTimestamp.as_str(),
                }),
            )
        })
}

/// Parse and normalise an email payload value.
pub(crate) fn parse_email(field: &'static str, value: &str) -> Result<EmailAddress, Error> {
    EmailAddress::new(value)
        .map_err(|err| invalid_value_error(field, value, err.to_string()))
}
