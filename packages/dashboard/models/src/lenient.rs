//! Tolerant field deserializers for backend payloads.
//!
//! The backend serializes whatever its scrapers produced, so a count may
//! arrive as a number, a numeric string, or `null`, and text fields may be
//! missing entirely. These helpers read such fields without failing: a
//! missing or unreadable number is `0`, a missing string is empty.
//!
//! Use them together with `#[serde(default)]` so absent keys are covered
//! as well as explicit `null`s.

use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads a string field; `null` becomes empty and scalars are stringified.
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Reads an optional string field; `null` and blank strings become `None`.
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = string(deserializer)?;
    Ok(if value.trim().is_empty() {
        None
    } else {
        Some(value)
    })
}

/// Reads a non-negative count. Negative, fractional-negative, non-finite
/// and unparseable values read as `0`; positive fractions are truncated.
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(value_to_f64)
        .map_or(0, f64_to_count))
}

/// Reads an optional non-negative count; `null` and unparseable values are
/// `None`.
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(value_to_f64)
        .map(f64_to_count))
}

/// Reads a signed integer (forecast totals may in principle be negative).
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn signed<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(value_to_f64)
        .map_or(0, |f| {
            #[allow(clippy::cast_possible_truncation)]
            let truncated = f.trunc() as i64;
            truncated
        }))
}

/// Reads a floating-point number, `0.0` when missing or unreadable.
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_number(deserializer)?.unwrap_or(0.0))
}

/// Reads an optional floating-point number (used for coordinates, where
/// "missing" must stay distinguishable from `0.0`).
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(value_to_f64))
}

/// Reads a list of strings, treating `null` as empty and stringifying any
/// scalar elements.
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Null => String::new(),
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Reads a list of counts with the same rules as [`count`].
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn count_list<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| value_to_f64(item).map_or(0, f64_to_count))
            .collect(),
        _ => Vec::new(),
    })
}

/// Reads a list of records. `null` or a non-array value is an empty list and
/// `null` elements are skipped.
///
/// # Errors
///
/// Fails if an element cannot be read as `T`.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(|item| T::deserialize(item).map_err(D::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Reads a nested object, using `T::default()` for `null`.
///
/// # Errors
///
/// Fails if a present value cannot be read as `T`.
pub fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses a calendar date in either of the formats the backend emits:
/// `dd.mm.yyyy` (display format) or `yyyy-mm-dd` (ISO).
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn f64_to_count(value: f64) -> u64 {
    if value <= 0.0 { 0 } else { value.trunc() as u64 }
}
