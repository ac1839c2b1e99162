//! Repairs for almost-JSON script literals.
//!
//! JavaScript object literals commonly use bare keys, single quotes or
//! arithmetic values. These helpers rewrite a delimited slice into something
//! a strict JSON parser accepts. They split on every comma and the first colon
//! of each entry, so nested structures are not preserved.

use serde_json::Value;
use tracing::trace;

use super::JsonShape;
use crate::expr::evaluate_expression;

/// Remove newlines and tabs.
#[must_use]
pub fn tidy_script(text: &str) -> String {
    text.replace(['\n', '\r', '\t'], "")
}

/// Re-emit every key and value of the slice as a quoted JSON string.
///
/// Returns `None` when the slice is not wrapped in the shape's delimiters or a
/// dictionary entry has no `:`.
///
/// # Example
///
/// ```rust
/// use scrapekit::json::{tidy_json, JsonShape};
///
/// assert_eq!(
///     tidy_json("{a: 1, 'b': x}", JsonShape::Dictionary).as_deref(),
///     Some(r#"{"a":"1","b":"x"}"#)
/// );
/// ```
#[must_use]
pub fn tidy_json(text: &str, shape: JsonShape) -> Option<String> {
    rebuild(text, shape, |value| Value::String(unquote(value).to_string()))
}

/// Like [`tidy_json`], but values that read as integers or integer arithmetic
/// are emitted as numbers.
///
/// # Example
///
/// ```rust
/// use scrapekit::json::{tidy_values, JsonShape};
///
/// assert_eq!(
///     tidy_values("[100, 300 + -50]", JsonShape::Array).as_deref(),
///     Some("[100,250]")
/// );
/// ```
#[must_use]
pub fn tidy_values(text: &str, shape: JsonShape) -> Option<String> {
    rebuild(text, shape, coerce_value)
}

fn rebuild(text: &str, shape: JsonShape, value: impl Fn(&str) -> Value) -> Option<String> {
    let (open, close) = shape.delimiters();
    let interior = text
        .trim()
        .strip_prefix(open)?
        .strip_suffix(close)?;

    let entries = interior
        .split(',')
        .filter(|entry| !entry.trim().is_empty());

    let mut parts = Vec::new();
    match shape {
        JsonShape::Array => {
            for entry in entries {
                parts.push(value(entry).to_string());
            }
        }
        JsonShape::Dictionary | JsonShape::Unknown => {
            for entry in entries {
                let Some((key, raw)) = entry.split_once(':') else {
                    trace!(entry, "dictionary entry without a key");
                    return None;
                };
                let key = Value::String(unquote(key).to_string());
                parts.push(format!("{key}:{}", value(raw)));
            }
        }
    }

    Some(format!("{open}{}{close}", parts.join(",")))
}

/// Integer literal or arithmetic when the value has no letters and is not
/// quoted; a string otherwise.
fn coerce_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    let quoted = trimmed.starts_with(['"', '\'']);

    if !quoted && !trimmed.is_empty() && !trimmed.chars().any(char::is_alphabetic) {
        if let Ok(number) = trimmed.parse::<i64>() {
            return Value::from(number);
        }
        if let Ok(number) = evaluate_expression(trimmed) {
            return Value::from(number);
        }
    }

    Value::String(unquote(trimmed).to_string())
}

fn unquote(text: &str) -> &str {
    text.trim().trim_matches(['"', '\'']).trim()
}
