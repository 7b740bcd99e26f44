//! Scalar normalizers turning fixture hex values into their RPC encoding.
use serde_json::Value;

/// Normalizes a single fixture scalar.
pub type Normalizer = fn(&str) -> String;

fn strip_0x(value: &str) -> Option<&str> {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
}

/// Drops the redundant leading zeros of a hex quantity: `0x00ab` becomes
/// `0xab`, and any zero value (`0x`, `0x0000`) becomes `0x0`. Digits are
/// lower-cased.
pub fn remove_leading_zeros(value: &str) -> String {
    let digits = strip_0x(value).unwrap_or(value).trim_start_matches('0');
    if digits.is_empty() {
        return "0x0".to_string();
    }
    format!("0x{}", digits.to_ascii_lowercase())
}

/// Maps an empty value to `0x` and prefixes any other value missing it.
pub fn empty_to_0x(value: &str) -> String {
    add_0x_prefix(value)
}

/// Prefixes the value with `0x` unless it already is.
pub fn add_0x_prefix(value: &str) -> String {
    match strip_0x(value) {
        Some(_) => value.to_string(),
        None => format!("0x{value}"),
    }
}

pub fn identity(value: &str) -> String {
    value.to_string()
}

/// Applies the normalizer to a JSON value. Only strings are normalized, every
/// other value is returned as is.
pub fn normalize_value(normalizer: Normalizer, value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalizer(s)),
        other => other.clone(),
    }
}

/// RPC encoding of a count or an index.
pub fn to_quantity(value: usize) -> String {
    format!("{value:#x}")
}

/// Parses a fixture hex quantity.
pub fn parse_quantity(value: &str) -> Option<u64> {
    let digits = strip_0x(value)?;
    if digits.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(digits, 16).ok()
}
