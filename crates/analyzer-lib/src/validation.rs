//! Input validation and normalization
//!
//! Raw records are untrusted JSON values. Each one is either converted into a
//! [`LogRecord`] or rejected with a [`Rejection`] reason. Rejections are counted,
//! never raised, so a batch with bad rows still produces a report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::models::{HttpMethod, LogRecord};

/// Fields every record must carry
pub const REQUIRED_FIELDS: [&str; 7] = [
    "endpoint",
    "timestamp",
    "status_code",
    "response_time_ms",
    "response_size_bytes",
    "user_id",
    "method",
];

/// Why a raw record was excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotAnObject,
    MissingField(&'static str),
    InvalidType(&'static str),
    InvalidTimestamp,
    StatusOutOfRange,
    NegativeValue(&'static str),
    EmptyValue(&'static str),
}

impl Rejection {
    /// Stable key used to bucket rejection counts
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::NotAnObject => "not_an_object",
            Rejection::MissingField(_) => "missing_field",
            Rejection::InvalidType(_) => "invalid_type",
            Rejection::InvalidTimestamp => "invalid_timestamp",
            Rejection::StatusOutOfRange => "status_out_of_range",
            Rejection::NegativeValue(_) => "negative_value",
            Rejection::EmptyValue(_) => "empty_value",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NotAnObject => write!(f, "record is not an object"),
            Rejection::MissingField(field) => write!(f, "missing field `{field}`"),
            Rejection::InvalidType(field) => write!(f, "field `{field}` has the wrong type"),
            Rejection::InvalidTimestamp => write!(f, "timestamp is not ISO-8601"),
            Rejection::StatusOutOfRange => write!(f, "status_code outside [100, 599]"),
            Rejection::NegativeValue(field) => write!(f, "field `{field}` is negative"),
            Rejection::EmptyValue(field) => write!(f, "field `{field}` is empty"),
        }
    }
}

/// Clean subset of a batch plus what was dropped
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub records: Vec<LogRecord>,
    pub rejected: usize,
    pub rejections_by_reason: BTreeMap<String, usize>,
}

/// Normalize a batch, dropping every record that fails a check
pub fn normalize(raw: &[Value]) -> ValidationOutcome {
    let mut outcome = ValidationOutcome {
        records: Vec::with_capacity(raw.len()),
        ..Default::default()
    };

    for (index, value) in raw.iter().enumerate() {
        match normalize_record(value) {
            Ok(record) => outcome.records.push(record),
            Err(rejection) => {
                trace!(index, reason = %rejection, "Rejected log record");
                outcome.rejected += 1;
                *outcome
                    .rejections_by_reason
                    .entry(rejection.reason().to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    debug!(
        valid = outcome.records.len(),
        rejected = outcome.rejected,
        "Validated log batch"
    );
    outcome
}

/// Convert a single raw value into a [`LogRecord`]
pub fn normalize_record(raw: &Value) -> Result<LogRecord, Rejection> {
    let obj = raw.as_object().ok_or(Rejection::NotAnObject)?;

    for field in REQUIRED_FIELDS {
        if obj.get(field).map_or(true, Value::is_null) {
            return Err(Rejection::MissingField(field));
        }
    }

    let endpoint = string_field(obj, "endpoint")?;
    if endpoint.trim().is_empty() {
        return Err(Rejection::EmptyValue("endpoint"));
    }

    let timestamp =
        parse_timestamp(string_field(obj, "timestamp")?).ok_or(Rejection::InvalidTimestamp)?;

    let status_code = status_field(obj)?;
    let response_time_ms = non_negative_field(obj, "response_time_ms")?;
    let response_size_bytes = size_field(obj)?;
    let user_id = string_field(obj, "user_id")?;

    let method = string_field(obj, "method")?;
    if method.trim().is_empty() {
        return Err(Rejection::EmptyValue("method"));
    }

    Ok(LogRecord {
        endpoint: endpoint.to_string(),
        timestamp,
        status_code,
        response_time_ms,
        response_size_bytes,
        user_id: user_id.to_string(),
        method: HttpMethod::from(method.trim().to_string()),
    })
}

/// Parse an ISO-8601 timestamp carrying `Z` or an explicit offset, as UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn string_field<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, Rejection> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or(Rejection::InvalidType(field))
}

fn status_field(obj: &Map<String, Value>) -> Result<u16, Rejection> {
    let number = match obj.get("status_code") {
        Some(Value::Number(n)) => n,
        _ => return Err(Rejection::InvalidType("status_code")),
    };

    let code = if let Some(code) = number.as_i64() {
        code
    } else if number.as_u64().is_some() {
        return Err(Rejection::StatusOutOfRange);
    } else {
        // Floats such as 200.0 are not status codes
        return Err(Rejection::InvalidType("status_code"));
    };

    if (100..=599).contains(&code) {
        Ok(code as u16)
    } else {
        Err(Rejection::StatusOutOfRange)
    }
}

fn non_negative_field(obj: &Map<String, Value>, field: &'static str) -> Result<f64, Rejection> {
    let value = match obj.get(field) {
        Some(Value::Number(n)) => n.as_f64().ok_or(Rejection::InvalidType(field))?,
        _ => return Err(Rejection::InvalidType(field)),
    };

    if !value.is_finite() {
        return Err(Rejection::InvalidType(field));
    }
    if value < 0.0 {
        return Err(Rejection::NegativeValue(field));
    }
    Ok(value)
}

fn size_field(obj: &Map<String, Value>) -> Result<u64, Rejection> {
    const FIELD: &str = "response_size_bytes";

    if let Some(bytes) = obj.get(FIELD).and_then(Value::as_u64) {
        return Ok(bytes);
    }
    // Fractional sizes are truncated to whole bytes
    non_negative_field(obj, FIELD).map(|bytes| bytes.trunc() as u64)
}
