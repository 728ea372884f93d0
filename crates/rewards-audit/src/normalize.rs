//! Date normalization.
//!
//! Exports carry dates in several shapes: Extended JSON wrappers
//! (`{"$date": 1609687531000}` or `{"$date": "2021-01-03T15:25:31Z"}`), plain
//! strings, or nothing at all. Everything is reduced to a timezone-naive
//! [`NaiveDateTime`] or the missing sentinel ([`FieldValue::Null`]).
//!
//! Offsets are dropped, not applied: `2021-01-03T10:00:00+05:00` becomes
//! `2021-01-03 10:00:00`. Wrapped epoch milliseconds are read as UTC.
//!
//! Nothing here fails. A value that cannot be read is logged and becomes null.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{Collection, FieldValue};

/// Field names that hold dates in any of the three exports.
pub const DATE_FIELDS: [&str; 8] = [
    "createDate",
    "dateScanned",
    "finishedDate",
    "pointsAwardedDate",
    "purchaseDate",
    "modifyDate",
    "createdDate",
    "lastLogin",
];

/// Formats with an explicit offset. The wall-clock part is kept.
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Formats without an offset, tried in order. Slash dates are month first.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%b %d, %Y %H:%M:%S%.f",
    "%b %d %Y %H:%M:%S%.f",
    "%d %b %Y %H:%M:%S%.f",
];

/// Date-only formats; the time of day is midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
];

/// Zone suffixes that name UTC without a numeric offset.
const UTC_SUFFIXES: [&str; 3] = [" UTC", " GMT", "Z"];

/// Parse a date/time string into a naive instant.
///
/// Accepts RFC 3339 and ISO-like shapes, slash dates, compact `YYYYMMDD`
/// (optionally `THHMMSS`), and textual months (`Jan 3, 2021`, `3 January
/// 2021`). A trailing `UTC`/`GMT` is ignored like any other zone.
pub fn parse_date_str(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.naive_local());
        }
    }

    let local = UTC_SUFFIXES
        .iter()
        .find_map(|suffix| trimmed.strip_suffix(suffix))
        .map_or(trimmed, str::trim_end);

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(local, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(local, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    parse_compact(local)
}

/// `YYYYMMDD` or `YYYYMMDDTHHMMSS`.
fn parse_compact(value: &str) -> Option<NaiveDateTime> {
    let (date, time) = match value.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (value, None),
    };
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(
        date[..4].parse().ok()?,
        date[4..6].parse().ok()?,
        date[6..].parse().ok()?,
    )?;
    match time {
        None => date.and_hms_opt(0, 0, 0),
        Some(time) if time.len() == 6 && time.bytes().all(|b| b.is_ascii_digit()) => date
            .and_hms_opt(
                time[..2].parse().ok()?,
                time[2..4].parse().ok()?,
                time[4..].parse().ok()?,
            ),
        Some(_) => None,
    }
}

fn from_epoch_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Read the payload of a `{"$date": ...}` wrapper.
fn parse_wrapped(inner: &Value) -> Option<NaiveDateTime> {
    match inner {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n.as_i64().and_then(from_epoch_millis),
        Value::Object(map) => map
            .get("$numberLong")
            .and_then(Value::as_str)
            .and_then(|s| s.trim().parse::<i64>().ok())
            .and_then(from_epoch_millis),
        _ => None,
    }
}

/// Read a single date-like value.
///
/// Returns `None` for nulls, unrecognized shapes and unparseable input.
pub fn parse_date(value: &FieldValue) -> Option<NaiveDateTime> {
    match value {
        FieldValue::Instant(dt) => Some(*dt),
        FieldValue::Null => None,
        FieldValue::Text(s) => {
            let parsed = parse_date_str(s);
            if parsed.is_none() {
                warn!("Error parsing date value: {:?}", s);
            }
            parsed
        }
        FieldValue::Object(map) => match map.get("$date") {
            Some(inner) => {
                let parsed = parse_wrapped(inner);
                if parsed.is_none() {
                    warn!("Error parsing date value: {}", value);
                }
                parsed
            }
            None => {
                debug!("Unrecognized date wrapper: {}", value);
                None
            }
        },
        other => {
            debug!("Unrecognized date value: {}", other);
            None
        }
    }
}

/// Normalize one value to an instant or the missing sentinel.
pub fn normalize_value(value: &FieldValue) -> FieldValue {
    parse_date(value).map_or(FieldValue::Null, FieldValue::Instant)
}

/// Return a copy of `collection` with every listed date field normalized.
///
/// Fields the collection doesn't have are skipped. Running this on an already
/// normalized collection returns an equal collection.
pub fn normalize_dates(collection: &Collection, fields: &[&str]) -> Collection {
    let mut normalized = collection.clone();
    for field in fields.iter().filter(|f| collection.has_column(f)) {
        normalized = normalized.map_column(field, normalize_value);
        let missing = normalized
            .column_values(field)
            .filter(|v| v.is_null())
            .count();
        debug!(
            "Normalized '{}' in {} ({} missing of {})",
            field,
            collection.name(),
            missing,
            normalized.len()
        );
    }
    normalized
}
