//! Adapters from upstream sensor attributes to fixed-length per-slot arrays.
//!
//! The optimizer core never inspects raw attribute maps: everything entering
//! it goes through these parsers first. Unusable readings degrade to zeros
//! (power) or `None` (price), never to errors.

pub mod forecast;
pub mod load;
pub mod price;

use serde_json::Value;

/// Numeric value of a JSON attribute, tolerating string-encoded numbers.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(string) => string.trim().parse().ok(),
        _ => None,
    }
}
