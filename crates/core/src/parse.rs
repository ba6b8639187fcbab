//! Tolerant parsing of text-generation output.
//!
//! Completion models routinely wrap the requested JSON in prose ("Sure! Here
//! is your goblin: {...}") and drift on key casing (`Name`, `NAME`). The
//! helpers here accept both: [`extract_json`] parses the span between the
//! first `{` and the last `}`, and [`lookup_field`] matches keys without
//! regard to ASCII case.

use serde_json::Value;

/// Errors from extracting or reading model output.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// No `{ ... }` span exists in the text.
    #[error("No JSON object found in response text")]
    NoJsonObject,

    /// A `{ ... }` span exists but is not valid JSON.
    #[error("Invalid JSON in response text: {0}")]
    Syntax(#[from] serde_json::Error),

    /// The requested key is absent.
    #[error("Property {0} not found")]
    FieldMissing(String),

    /// The key is present but `null` or an empty string.
    #[error("Property {0} is empty or undefined")]
    FieldEmpty(String),
}

/// Parse the JSON object embedded in `text`.
///
/// Uses the first `{` and the last `}` so nested objects survive intact.
pub fn extract_json(text: &str) -> Result<Value, ParseError> {
    let start = text.find('{').ok_or(ParseError::NoJsonObject)?;
    let end = text.rfind('}').ok_or(ParseError::NoJsonObject)?;
    if end < start {
        return Err(ParseError::NoJsonObject);
    }
    Ok(serde_json::from_str(&text[start..=end])?)
}

/// Look up `name` in a JSON object, ignoring key case.
///
/// The first matching key in document order wins (`serde_json` is built
/// with `preserve_order`).
pub fn lookup_field<'a>(object: &'a Value, name: &str) -> Result<&'a Value, ParseError> {
    let map = object
        .as_object()
        .ok_or_else(|| ParseError::FieldMissing(name.to_string()))?;

    let (_, value) = map
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .ok_or_else(|| ParseError::FieldMissing(name.to_string()))?;

    match value {
        Value::Null => Err(ParseError::FieldEmpty(name.to_string())),
        Value::String(s) if s.is_empty() => Err(ParseError::FieldEmpty(name.to_string())),
        other => Ok(other),
    }
}
