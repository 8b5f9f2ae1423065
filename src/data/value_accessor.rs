//! Value resolution and coercion for grid rows
//!
//! Rows are JSON records. Column keys may address nested fields with dots
//! (`"address.city"`, `"tags.0"`). Every engine stage reads values through
//! this module so that missing paths, nulls and mixed types are handled the
//! same way everywhere.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Number, Value};

/// Resolve a (possibly dotted) column key against a row.
///
/// Returns `None` when any segment of the path is absent. Never panics.
pub fn resolve<'a>(row: &'a Value, key: &str) -> Option<&'a Value> {
    // A literal key containing dots wins over path traversal
    if let Some(value) = row.as_object().and_then(|obj| obj.get(key)) {
        return Some(value);
    }

    let mut current = row;
    for segment in key.split('.') {
        current = match current {
            Value::Object(obj) => obj.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Return a copy of `row` with the value at `key` replaced.
///
/// Intermediate objects are created when missing. A literal top-level key
/// containing dots is updated in place of the nested path.
pub fn assign(row: &Value, key: &str, new_value: Value) -> Value {
    let mut copy = row.clone();

    if let Some(obj) = copy.as_object_mut() {
        if obj.contains_key(key) {
            obj.insert(key.to_string(), new_value);
            return copy;
        }
    }

    let segments: Vec<&str> = key.split('.').collect();
    assign_path(&mut copy, &segments, new_value);
    copy
}

fn assign_path(target: &mut Value, segments: &[&str], new_value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = new_value;
        return;
    };

    if let Value::Array(items) = target {
        if let Some(slot) = head.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            assign_path(slot, rest, new_value);
            return;
        }
    }

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(obj) = target {
        let slot = obj.entry(head.to_string()).or_insert(Value::Null);
        assign_path(slot, rest, new_value);
    }
}

/// Format a number the way a user typed it: `30` rather than `30.0`
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        // Plain digits up to 1e21; a cast to i64 would saturate past 2^63
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Stringify a resolved value for search, text filters and export
pub fn to_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())
            }
        }
        Some(other) => other.to_string(),
    }
}

/// Numeric coercion. Missing values and unparseable text become NaN.
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(_) => f64::NAN,
    }
}

/// Parse user-entered text as a number. Blank text is zero.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Parse user-entered text as a boolean
pub fn parse_bool(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower == "true" || lower == "1" || lower == "yes"
}

/// Boolean coercion used by boolean filters and sorting
pub fn to_bool(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => parse_bool(s),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Date coercion to epoch milliseconds
pub fn to_timestamp(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => parse_datetime(s).map(|dt| dt.timestamp_millis()),
        _ => None,
    }
}

/// Parse the date and date-time layouts accepted in date columns.
///
/// Values without an offset are taken as UTC.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// Convert a float into a JSON value, keeping exact integers integral.
///
/// Non-finite numbers have no JSON representation and become null.
pub fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}
