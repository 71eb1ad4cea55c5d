//! # Lenient Field Decoding
//!
//! Records arrive from the store as untyped JSON that years of hand edits
//! and spreadsheet imports have shaped. A price may be `1200`, `"1200"`,
//! `"1200.50"`, `""` or `null`; an id may be a number.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  JSON value         decimal()   opt_decimal()   present_decimal()       │
//! │  ─────────────────  ─────────   ─────────────   ─────────────────       │
//! │  12.5 / "12.5"      12.5        Some(12.5)      Some(12.5)              │
//! │  "" / null / absent 0           None            None                    │
//! │  "abc" / [] / {}    0           None            Some(0)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These functions are used through `#[serde(deserialize_with = ...)]`
//! together with `#[serde(default)]`, so an absent key decodes like `null`.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

// =============================================================================
// Value Conversions
// =============================================================================

/// Reads a number out of a JSON value. Blank strings and non-numeric values
/// yield `None`.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(decimal_from_f64)
            }
        }
        Value::String(s) => decimal_from_str(s),
        Value::Bool(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
        _ => None,
    }
}

/// Parses a trimmed decimal string, accepting exponent notation.
pub fn decimal_from_str(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
        .or_else(|| text.parse::<f64>().ok().and_then(decimal_from_f64))
}

fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::from_f64(value)
    } else {
        None
    }
}

/// Writes a decimal as a plain JSON number.
pub fn decimal_to_value(value: Decimal) -> Value {
    value
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// True for `null`, `""` and whitespace-only strings.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Renders an id that may be stored as a string or a number.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Serde Adapters
// =============================================================================

/// Number or 0.
pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(decimal_from_value)
        .unwrap_or_default())
}

/// Number, or `None` for blank or non-numeric input.
pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_value))
}

/// `None` only when blank. Anything else present but unreadable counts as 0.
///
/// Used for payment fields, where "the user typed something" and "the user
/// left it empty" lead to different reconciliation paths.
pub fn present_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None => None,
        Some(v) if is_blank(&v) => None,
        Some(v) => Some(decimal_from_value(&v).unwrap_or_default()),
    })
}

/// Whole number ≥ 1; anything else becomes 1.
pub fn unit_divisor<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(decimal_from_value)
        .and_then(|d| d.trunc().to_u32())
        .filter(|d| *d >= 1)
        .unwrap_or(1))
}

/// Whole stock count, truncated; unreadable → 0.
pub fn count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(decimal_from_value)
        .and_then(|d| d.trunc().to_i64())
        .unwrap_or(0))
}

/// String or number id; blank → empty string.
pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value).unwrap_or_default())
}

/// String or number id; blank → `None`.
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}

/// Text; `null` → empty, numbers are rendered.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Text; `null` and blank → `None`.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// `true`, `"true"`, or any non-zero number.
pub fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// Array of `T`; `null` or absent → empty.
pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// JSON object; anything else → empty map.
pub fn object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

/// `YYYY-MM-DD`, optionally followed by a time part; unreadable → `None`.
pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => parse_date(&s),
        _ => None,
    })
}

/// Parses the leading `YYYY-MM-DD` of a date or timestamp string.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let head = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "decimal")]
        amount: Decimal,
        #[serde(default, deserialize_with = "opt_decimal")]
        maybe: Option<Decimal>,
        #[serde(default, deserialize_with = "present_decimal")]
        paid: Option<Decimal>,
        #[serde(default = "one", deserialize_with = "unit_divisor")]
        divisor: u32,
        #[serde(default, deserialize_with = "id")]
        id: String,
        #[serde(default, deserialize_with = "date")]
        day: Option<NaiveDate>,
    }

    fn one() -> u32 {
        1
    }

    fn probe(value: Value) -> Probe {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_numbers_and_strings() {
        let p = probe(json!({ "amount": "12.50", "maybe": 3, "paid": 1.25, "divisor": "10", "id": 42 }));
        assert_eq!(p.amount, Decimal::new(1250, 2));
        assert_eq!(p.maybe, Some(Decimal::from(3)));
        assert_eq!(p.paid, Some(Decimal::new(125, 2)));
        assert_eq!(p.divisor, 10);
        assert_eq!(p.id, "42");
    }

    #[test]
    fn test_blank_and_missing() {
        let p = probe(json!({ "amount": "", "maybe": "", "paid": "", "divisor": null }));
        assert_eq!(p.amount, Decimal::ZERO);
        assert_eq!(p.maybe, None);
        assert_eq!(p.paid, None);
        assert_eq!(p.divisor, 1);
        assert_eq!(p.id, "");
        assert_eq!(p.day, None);
    }

    #[test]
    fn test_garbage() {
        let p = probe(json!({ "amount": "abc", "maybe": "abc", "paid": "abc", "divisor": 0 }));
        assert_eq!(p.amount, Decimal::ZERO);
        assert_eq!(p.maybe, None);
        assert_eq!(p.paid, Some(Decimal::ZERO));
        assert_eq!(p.divisor, 1);
    }

    #[test]
    fn test_dates() {
        let p = probe(json!({ "day": "2024-03-05T10:00:00.000Z" }));
        assert_eq!(p.day, NaiveDate::from_ymd_opt(2024, 3, 5));
        let p = probe(json!({ "day": "05/03/2024" }));
        assert_eq!(p.day, None);
    }

    #[test]
    fn test_scientific_string() {
        assert_eq!(decimal_from_str("1e3"), Some(Decimal::from(1000)));
        assert_eq!(decimal_from_str("  "), None);
    }
}
