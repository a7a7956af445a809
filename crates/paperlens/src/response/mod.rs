//! Extracting a JSON object from model output.
//!
//! Models are asked for a bare JSON object but routinely wrap it in markdown
//! fences, nest it in an extra pair of braces or emit backslashes that are not
//! valid JSON escapes. [`parse_response`] strips the fence, tries a strict
//! parse and then runs a fixed sequence of repairs before giving up.

pub mod scanner;

use serde_json::Value;
use thiserror::Error;

use crate::sanitize;

/// A parsed model answer.
pub type JsonObject = serde_json::Map<String, Value>;

/// Longest raw response carried in a [`ParseFailure`].
pub const RAW_SNIPPET_CHARS: usize = 500;

/// The response could not be turned into a JSON object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseFailure {
    /// Error from the strict parse of the (fence-stripped) text.
    pub message: String,
    /// Start of the raw response text.
    pub raw: String,
}

/// Parses model output into a JSON object.
///
/// Returns `Ok(None)` when there is nothing to parse (empty text, or an empty
/// fenced block); callers treat that as a skipped row.
pub fn parse_response(text: &str) -> Result<Option<JsonObject>, ParseFailure> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let body = strip_fence(text).trim();
    if body.is_empty() {
        return Ok(None);
    }

    let strict_error = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => return Ok(Some(map)),
        Ok(other) => format!("expected a JSON object, found {}", kind_of(&other)),
        Err(e) => e.to_string(),
    };

    recover(body).map(Some).ok_or_else(|| ParseFailure {
        message: strict_error,
        raw: sanitize::truncate_chars(text, RAW_SNIPPET_CHARS),
    })
}

/// Content of the first fenced block, preferring a ```` ```json ```` fence over
/// a plain one. Text without a fence is returned unchanged. An unterminated
/// fence runs to the end of the text.
pub fn strip_fence(text: &str) -> &str {
    let start = match text.find("```json") {
        Some(i) => i + "```json".len(),
        None => match text.find("```") {
            Some(i) => i + "```".len(),
            None => return text,
        },
    };

    let rest = &text[start..];
    match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Repairs: outermost braces, double-wrap, invalid escapes, double-wrap again.
fn recover(body: &str) -> Option<JsonObject> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }

    let slice = scanner::unwrap_double_wrap(&body[start..=end]);
    let fixed = scanner::fix_invalid_escapes(&slice);
    let candidate = scanner::unwrap_double_wrap(&fixed);

    match serde_json::from_str::<Value>(&candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
