//! Best-effort JSON extraction from script text.
//!
//! Script blobs rarely hold a clean JSON document. [`extract_json`] isolates
//! the first delimited candidate and walks it through increasingly forgiving
//! stages until one parses:
//!
//! 1. strict parse of the isolated slice,
//! 2. strict parse after stripping newlines and tabs,
//! 3. structural repair with integer coercion ([`repair::tidy_values`]),
//! 4. structural repair quoting every value ([`repair::tidy_json`]).
//!
//! Delimiter matching is deliberately naive: the candidate ends at the first
//! closing delimiter after the opening one, nesting is not counted, and the
//! repair split is on every comma. Inputs whose values contain the closing
//! delimiter or commas come out truncated or mis-split.
//!
//! Results are always a key-to-value map. A top-level array is stored under
//! the synthetic key [`ARRAY_KEY`].

pub mod repair;

pub use repair::{tidy_json, tidy_script, tidy_values};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Decoded JSON object.
pub type JsonMap = Map<String, Value>;

/// Key under which a top-level array is stored.
pub const ARRAY_KEY: &str = "[]";

/// Expected shape of a JSON blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonShape {
    Array,
    Dictionary,
    #[default]
    Unknown,
}

impl JsonShape {
    /// Opening and closing delimiter. `Unknown` uses the dictionary pair.
    #[must_use]
    pub fn delimiters(self) -> (char, char) {
        match self {
            Self::Array => ('[', ']'),
            Self::Dictionary | Self::Unknown => ('{', '}'),
        }
    }
}

/// Determine the shape of `text` from whichever of `{` / `[` occurs first.
///
/// Returns the shape and the byte offset of its opening delimiter. Without
/// either delimiter the shape is `Dictionary` with no offset.
#[must_use]
pub fn identify_fragment(text: &str) -> (JsonShape, Option<usize>) {
    match (text.find('{'), text.find('[')) {
        (Some(dict), Some(arr)) if arr < dict => (JsonShape::Array, Some(arr)),
        (Some(dict), _) => (JsonShape::Dictionary, Some(dict)),
        (None, Some(arr)) => (JsonShape::Array, Some(arr)),
        (None, None) => (JsonShape::Dictionary, None),
    }
}

/// Slice `text` from the opening delimiter of `shape` through the next
/// closing delimiter.
///
/// An `Unknown` shape is resolved with [`identify_fragment`]. Without an
/// opening delimiter the whole text is returned; without a closing one the
/// slice runs to the end.
///
/// # Example
///
/// ```rust
/// use scrapekit::json::{isolate_json, JsonShape};
///
/// let (slice, shape) = isolate_json("var x = {a:1};\nvar y = [1];", JsonShape::Dictionary);
/// assert_eq!(slice, "{a:1}");
/// assert_eq!(shape, JsonShape::Dictionary);
/// ```
#[must_use]
pub fn isolate_json(text: &str, shape: JsonShape) -> (&str, JsonShape) {
    let shape = match shape {
        JsonShape::Unknown => identify_fragment(text).0,
        known => known,
    };
    let (open, close) = shape.delimiters();

    let Some(start) = text.find(open) else {
        return (text, shape);
    };
    let rest = &text[start..];
    let end = rest
        .find(close)
        .map_or(rest.len(), |idx| idx + close.len_utf8());

    (&rest[..end], shape)
}

/// Strict parse into a map. A top-level array is wrapped under [`ARRAY_KEY`].
pub fn from_json(text: &str) -> Result<JsonMap> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Array(items)) => {
            let mut map = JsonMap::new();
            map.insert(ARRAY_KEY.to_string(), Value::Array(items));
            Ok(map)
        }
        Ok(other) => Err(Error::NotJson(format!(
            "expected an object or array, found {other}"
        ))),
        Err(err) => Err(Error::NotJson(err.to_string())),
    }
}

/// Serialize a map back to JSON text.
pub fn to_json(map: &JsonMap) -> Result<String> {
    serde_json::to_string(map).map_err(|err| Error::NotJson(err.to_string()))
}

/// Isolate and parse the JSON blob in `text`, repairing it if needed.
///
/// # Example
///
/// ```rust
/// use scrapekit::json::{extract_json, JsonShape};
///
/// let map = extract_json("var x = {abc:123, def:\"789\"};", JsonShape::Dictionary)?;
/// assert_eq!(map.len(), 2);
/// assert_eq!(map["abc"], 123);
/// # Ok::<(), scrapekit::Error>(())
/// ```
pub fn extract_json(text: &str, shape: JsonShape) -> Result<JsonMap> {
    let (candidate, shape) = isolate_json(text, shape);

    match from_json(candidate) {
        Ok(map) => return Ok(map),
        Err(err) => debug!(stage = "strict", error = %err, "JSON parse failed"),
    }

    let tidied = tidy_script(candidate);
    match from_json(&tidied) {
        Ok(map) => return Ok(map),
        Err(err) => debug!(stage = "whitespace", error = %err, "JSON parse failed"),
    }

    let repairs = [
        ("numeric", tidy_values(&tidied, shape)),
        ("quoted", tidy_json(&tidied, shape)),
    ];
    for (stage, repaired) in repairs {
        let Some(repaired) = repaired else {
            debug!(stage, "structural repair not applicable");
            continue;
        };
        match from_json(&repaired) {
            Ok(map) => return Ok(map),
            Err(err) => debug!(stage, error = %err, "JSON parse failed"),
        }
    }

    Err(Error::NotJson(format!(
        "no parse of {shape:?} candidate {}",
        preview(candidate)
    )))
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 40;
    if text.chars().count() <= MAX_CHARS {
        format!("{text:?}")
    } else {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{head:?}...")
    }
}
