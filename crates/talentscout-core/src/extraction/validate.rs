//! Per-field decoding and validation of extracted values.
//!
//! A field whose raw value is mistyped or fails validation is discarded on
//! its own; the rest of the extraction still counts.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use talentscout_types::profile::{FieldValue, ProfileField};

use super::json::MalformedExtraction;

pub const MAX_YEARS_EXPERIENCE: f32 = 50.0;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.+-]+@[\w-]+(?:\.[\w-]+)*\.[A-Za-z]{2,}$").expect("valid email regex")
});

static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*\+?").expect("valid number regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// At least 10 digits once spaces, dashes, dots, and parentheses are removed.
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')' | '+'));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    allowed && (10..=15).contains(&digits)
}

/// Letters, spaces, and `.-'`, at least two letters.
pub fn is_valid_name(name: &str) -> bool {
    let name = name.trim();
    name.chars().filter(|c| c.is_alphabetic()).count() >= 2
        && name
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, ' ' | '.' | '-' | '\''))
}

/// Parse "4", "4.5", "5+", or "4 years" into a year count within range.
pub fn parse_years(raw: &str) -> Option<f32> {
    let caps = LEADING_NUMBER_RE.captures(raw)?;
    let years: f32 = caps.get(1)?.as_str().parse().ok()?;
    years_in_range(years)
}

fn years_in_range(years: f32) -> Option<f32> {
    (years.is_finite() && (0.0..=MAX_YEARS_EXPERIENCE).contains(&years)).then_some(years)
}

/// Collapse internal whitespace runs to single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split "Go, Postgres and Rust" style lists into tokens.
pub fn split_list(s: &str) -> Vec<String> {
    s.split([',', ';', '/', '\n'])
        .flat_map(|part| part.split(" and "))
        .map(normalize_whitespace)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Decode one field of a structured extraction.
///
/// `Ok(None)` means "not mentioned" (`null`, empty string, empty list).
pub fn decode_field(
    field: ProfileField,
    raw: &Value,
) -> Result<Option<FieldValue>, MalformedExtraction> {
    let invalid = |reason: &str| MalformedExtraction::InvalidField {
        field,
        reason: reason.to_string(),
    };

    let blank = match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    if blank {
        return Ok(None);
    }

    let value = match field {
        ProfileField::FullName => {
            let name = normalize_whitespace(raw.as_str().ok_or_else(|| invalid("expected a string"))?);
            if !is_valid_name(&name) {
                return Err(invalid("not a plausible name"));
            }
            FieldValue::Text(name)
        }
        ProfileField::Email => {
            let email = raw
                .as_str()
                .ok_or_else(|| invalid("expected a string"))?
                .trim();
            if !is_valid_email(email) {
                return Err(invalid("not an email address"));
            }
            FieldValue::Text(email.to_string())
        }
        ProfileField::Phone => {
            let phone = match raw {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return Err(invalid("expected a string")),
            };
            if !is_valid_phone(&phone) {
                return Err(invalid("fewer than 10 digits"));
            }
            FieldValue::Text(phone)
        }
        ProfileField::YearsExperience => {
            let years = match raw {
                Value::Number(n) => n.as_f64().and_then(|y| years_in_range(y as f32)),
                Value::String(s) => parse_years(s),
                _ => return Err(invalid("expected a number")),
            };
            FieldValue::Years(years.ok_or_else(|| invalid("not a year count between 0 and 50"))?)
        }
        ProfileField::DesiredPositions | ProfileField::TechStack => {
            let tokens: Vec<String> = match raw {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(normalize_whitespace)
                    .collect(),
                Value::String(s) => split_list(s),
                _ => return Err(invalid("expected a list of strings")),
            };
            FieldValue::set_from(tokens)
        }
        ProfileField::Location => {
            let location = normalize_whitespace(raw.as_str().ok_or_else(|| invalid("expected a string"))?);
            FieldValue::Text(location)
        }
    };

    Ok((!value.is_empty()).then_some(value))
}
