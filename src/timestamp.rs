//! Timestamp codec for Simplenote's fixed UTC format
//!
//! The service writes timestamps like `2022-06-27T01:39:12.602Z`: always UTC,
//! always a trailing `Z`, always millisecond precision. The fields are parsed
//! as UTC, never as local time.

use crate::error::{ExportError, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

const UTC_MARKER: char = 'Z';
const PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.f";
const MAX_FRACTION_DIGITS: usize = 6;

/// Parse a service timestamp into a UTC instant
///
/// The fraction is kept, so `encode(&decode(s)?) == s` for every timestamp
/// in the service's millisecond format.
pub fn decode(value: &str) -> Result<DateTime<Utc>> {
    let body = value
        .strip_suffix(UTC_MARKER)
        .ok_or_else(|| ExportError::format(value, "missing trailing 'Z' UTC marker"))?;

    // chrono's %.f also accepts an absent fraction; the service format requires one
    let (_, fraction) = body
        .rsplit_once('.')
        .ok_or_else(|| ExportError::format(value, "missing fractional seconds"))?;
    if fraction.is_empty()
        || fraction.len() > MAX_FRACTION_DIGITS
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ExportError::format(
            value,
            "fractional seconds must be 1 to 6 digits",
        ));
    }

    let naive = NaiveDateTime::parse_from_str(body, PATTERN)
        .map_err(|e| ExportError::format(value, e.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Parse a service timestamp and express it in the host's timezone (display only)
pub fn decode_to_local(value: &str) -> Result<DateTime<Local>> {
    Ok(decode(value)?.with_timezone(&Local))
}

/// Format a UTC instant in the service format with millisecond precision
pub fn encode(datetime: &DateTime<Utc>) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Format whole epoch seconds in the service format (`.000Z`)
pub fn encode_seconds(epoch_seconds: i64) -> Result<String> {
    let datetime = Utc
        .timestamp_opt(epoch_seconds, 0)
        .single()
        .ok_or_else(|| ExportError::format(&epoch_seconds.to_string(), "out of range"))?;
    Ok(encode(&datetime))
}
