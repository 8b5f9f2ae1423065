//! Column type inference for rows loaded without explicit column metadata
//!
//! Detection runs over a sample of rows and merges per-value guesses into a
//! single column type, so that a grid built from a raw JSON or CSV file gets
//! numeric sorting, date filters and boolean toggles where they apply.

use crate::data::column::{ColumnDef, ColumnType};
use crate::data::row::Row;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Rows inspected per column when guessing types
const SAMPLE_SIZE: usize = 100;

/// Static compiled regex patterns for date detection
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // YYYY-MM-DD
        Regex::new(r"^(19|20)\d{2}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").unwrap(),
        // MM/DD/YYYY
        Regex::new(r"^(0[1-9]|1[0-2])/(0[1-9]|[12]\d|3[01])/(19|20)\d{2}$").unwrap(),
        // YYYY/MM/DD
        Regex::new(r"^(19|20)\d{2}/(0[1-9]|1[0-2])/(0[1-9]|[12]\d|3[01])$").unwrap(),
        // ISO 8601 with time, optional fraction and offset
        Regex::new(
            r"^(19|20)\d{2}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])[T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:\d{2})?$",
        )
        .unwrap(),
    ]
});

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?|ftp)://[^\s/$.?#].[^\s]*$").unwrap());

/// Guess of a single value's type. `None` for nulls, which merge with anything.
pub fn infer_value(value: &Value) -> Option<ColumnType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(ColumnType::Boolean),
        Value::Number(_) => Some(ColumnType::Number),
        Value::String(s) => Some(infer_from_string(s)),
        Value::Array(_) | Value::Object(_) => Some(ColumnType::String),
    }
}

/// Infer the type of a text value, e.g. a CSV field
pub fn infer_from_string(value: &str) -> ColumnType {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        return ColumnType::Boolean;
    }
    if !value.is_empty() && value.parse::<f64>().is_ok() {
        return ColumnType::Number;
    }
    if looks_like_datetime(value) {
        return ColumnType::Date;
    }
    if EMAIL_PATTERN.is_match(value) {
        return ColumnType::Email;
    }
    if URL_PATTERN.is_match(value) {
        return ColumnType::Url;
    }
    ColumnType::String
}

/// Strict date detection that avoids IDs like "ORDER-2024-001"
pub fn looks_like_datetime(value: &str) -> bool {
    if value.len() < 8 || value.len() > 35 {
        return false;
    }
    DATE_PATTERNS.iter().any(|pattern| pattern.is_match(value))
}

/// Merge two guesses for the same column. Disagreement falls back to text.
pub fn merge_types(a: Option<ColumnType>, b: Option<ColumnType>) -> Option<ColumnType> {
    match (a, b) {
        (None, t) | (t, None) => t,
        (Some(x), Some(y)) if x == y => Some(x),
        _ => Some(ColumnType::String),
    }
}

/// "first_name" / "firstName" / "address.city" -> "First Name" / "Address City"
pub fn humanize_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch == '.' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build column definitions from the fields of the sampled rows.
///
/// Field order follows first appearance. Nested objects are not flattened.
pub fn infer_columns(rows: &[Row]) -> Vec<ColumnDef> {
    let mut keys: Vec<String> = Vec::new();
    let mut types: Vec<Option<ColumnType>> = Vec::new();

    for row in rows.iter().take(SAMPLE_SIZE) {
        let Some(obj) = row.as_object() else {
            continue;
        };
        for (key, value) in obj {
            let guess = infer_value(value);
            match keys.iter().position(|k| k == key) {
                Some(idx) => types[idx] = merge_types(types[idx], guess),
                None => {
                    keys.push(key.clone());
                    types.push(guess);
                }
            }
        }
    }

    keys.into_iter()
        .zip(types)
        .map(|(key, column_type)| {
            let label = humanize_key(&key);
            ColumnDef::new(key, label).with_type(column_type.unwrap_or_default())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::row::rows_from_values;
    use serde_json::json;

    #[test]
    fn test_infer_from_string() {
        assert_eq!(infer_from_string("true"), ColumnType::Boolean);
        assert_eq!(infer_from_string("42"), ColumnType::Number);
        assert_eq!(infer_from_string("-1.5e3"), ColumnType::Number);
        assert_eq!(infer_from_string("2024-01-31"), ColumnType::Date);
        assert_eq!(infer_from_string("2024-01-31T10:00:00Z"), ColumnType::Date);
        assert_eq!(infer_from_string("ann@example.com"), ColumnType::Email);
        assert_eq!(infer_from_string("https://example.com/a"), ColumnType::Url);
        assert_eq!(infer_from_string("ORDER-2024-001"), ColumnType::String);
        assert_eq!(infer_from_string(""), ColumnType::String);
    }

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("first_name"), "First Name");
        assert_eq!(humanize_key("firstName"), "First Name");
        assert_eq!(humanize_key("address.city"), "Address City");
        assert_eq!(humanize_key("id"), "Id");
    }

    #[test]
    fn test_infer_columns_merges_types() {
        let rows = rows_from_values(vec![
            json!({"id": 1, "name": "Ann", "joined": "2024-01-02", "score": null}),
            json!({"id": 2, "name": "Bob", "joined": "2024-02-03", "score": 3.5, "active": true}),
            json!({"id": "x3", "name": "Cy", "joined": null}),
        ]);
        let columns = infer_columns(&rows);
        let summary: Vec<(&str, ColumnType)> = columns
            .iter()
            .map(|c| (c.key.as_str(), c.column_type))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("id", ColumnType::String),
                ("name", ColumnType::String),
                ("joined", ColumnType::Date),
                ("score", ColumnType::Number),
                ("active", ColumnType::Boolean),
            ]
        );
        assert_eq!(columns[2].label, "Joined");
    }
}
