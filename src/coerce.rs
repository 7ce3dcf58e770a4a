//! Value coercion at the upstream boundary.
//!
//! Upstream rows arrive as untyped JSON and individual cells routinely show
//! up as numbers, numeric strings, nulls, or are missing outright. Every
//! numeric cell is funneled through [`num`] before any arithmetic so a
//! malformed value degrades to a zero contribution instead of poisoning a
//! sum, and identity fields go through [`text`] so absent values render as
//! empty strings. Both functions are total: no input panics or errors.

use serde_json::Value;

/// Coerce an optional JSON value to a finite `f64`.
///
/// Numbers pass through, numeric strings are trimmed and parsed, booleans
/// map to 1.0/0.0. Everything else (null, absent field, non-numeric string,
/// array, object) coerces to 0.0. Non-finite parse results such as
/// `"Infinity"` or an overflowing exponent also coerce to 0.0, so the
/// result is always finite.
pub fn num(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

/// Coerce an optional JSON value to a display string.
///
/// Strings pass through, numbers and booleans render with their canonical
/// form, everything else (null, absent, array, object) becomes the empty
/// string.
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
