//! Shared utilities for the audit checks.
//!
//! Numeric coercion and the literal formatting used when findings quote
//! sample values.

use chrono::{NaiveDateTime, Timelike};

use crate::error::{AuditError, Result};
use crate::types::FieldValue;

/// Maximum number of sample values quoted by a finding.
pub const SAMPLE_LIMIT: usize = 3;

// =============================================================================
// Numeric Coercion
// =============================================================================

/// Try to parse a string as a numeric value (f64).
///
/// Only surrounding whitespace is tolerated. Currency symbols and thousands
/// separators make the value non-numeric.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Coerce a field value to a number.
///
/// Returns `Ok(None)` for values without a numeric reading (nulls, booleans,
/// instants, unparseable text) so they never match a numeric comparison.
/// Nested arrays and objects are a conversion error for the whole column,
/// reported with the record position where they were found.
pub fn coerce_numeric(column: &str, position: usize, value: &FieldValue) -> Result<Option<f64>> {
    match value {
        FieldValue::Number(n) => Ok(n.as_f64()),
        FieldValue::Text(s) => Ok(parse_numeric_string(s)),
        FieldValue::Null | FieldValue::Bool(_) | FieldValue::Instant(_) => Ok(None),
        FieldValue::Array(_) | FieldValue::Object(_) => Err(AuditError::TypeConversionFailed {
            column: column.to_string(),
            reason: format!("invalid nested value at position {}", position),
        }),
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Format an instant the way the findings quote dates.
///
/// Whole seconds print as `YYYY-MM-DD HH:MM:SS`; fractional seconds add
/// microseconds, or nanoseconds when the value needs them.
pub fn format_instant(dt: &NaiveDateTime) -> String {
    let nanos = dt.nanosecond() % 1_000_000_000;
    if nanos == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else if nanos % 1_000 == 0 {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.9f").to_string()
    }
}

/// Join at most [`SAMPLE_LIMIT`] samples with `", "`, keeping their order.
pub fn join_samples<I, T>(samples: I) -> String
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    samples
        .into_iter()
        .take(SAMPLE_LIMIT)
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
