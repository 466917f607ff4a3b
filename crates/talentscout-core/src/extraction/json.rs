//! Recovery of a JSON object from free-form model output.
//!
//! Models wrap JSON in markdown fences, prepend chatter ("Sure! Here is..."),
//! or trail explanations. Parsing tries, in order: the fence-stripped text as
//! strict JSON, then each balanced `{...}` substring in turn.

use serde_json::{Map, Value};
use thiserror::Error;

use talentscout_types::profile::ProfileField;

/// Model output that could not be used as structured extraction.
///
/// Internal to extraction: it only ever triggers the pattern fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedExtraction {
    #[error("no JSON object found in model output")]
    NoObject,

    #[error("model output is JSON but not an object")]
    NotAnObject,

    #[error("field '{field}' has an unusable value: {reason}")]
    InvalidField { field: ProfileField, reason: String },
}

/// Strip a surrounding markdown code fence, with or without a language tag.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let rest = rest.trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

/// Parse model output into a JSON object.
pub fn parse_object(raw: &str) -> Result<Map<String, Value>, MalformedExtraction> {
    let text = strip_json_fences(raw);

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => return Ok(map),
        Ok(_) => return Err(MalformedExtraction::NotAnObject),
        Err(_) => {}
    }

    let mut from = 0;
    while let Some((start, end)) = find_balanced_object(text, from) {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..end]) {
            return Ok(map);
        }
        from = start + 1;
    }
    Err(MalformedExtraction::NoObject)
}

/// Byte range of the first balanced `{...}` starting at or after `from`.
///
/// Braces inside JSON string literals (including escaped quotes) are ignored.
fn find_balanced_object(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let start = from + text.get(from..)?.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + offset + 1));
                }
            }
            _ => {}
        }
    }
    None
}
