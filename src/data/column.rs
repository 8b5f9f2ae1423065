use crate::data::value_accessor::{self, number_to_json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Declared type of a column. Drives filtering, sorting and edit parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Date,
    Boolean,
    Email,
    Url,
}

impl ColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Boolean => "boolean",
            ColumnType::Email => "email",
            ColumnType::Url => "url",
        }
    }
}

/// A parsed edit value, typed by the column it was entered into
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    /// May be NaN when the input was not numeric
    Number(f64),
    Boolean(bool),
    /// `None` when the input was not a recognisable date
    Date(Option<DateTime<Utc>>),
}

impl CellValue {
    /// Parse raw editor input according to the column type
    pub fn parse(raw: &str, column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Number => CellValue::Number(value_accessor::parse_number(raw)),
            ColumnType::Boolean => CellValue::Boolean(value_accessor::parse_bool(raw)),
            ColumnType::Date => CellValue::Date(value_accessor::parse_datetime(raw)),
            ColumnType::String | ColumnType::Email | ColumnType::Url => {
                CellValue::Text(raw.to_string())
            }
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON representation stored back into the row
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Number(n) => number_to_json(*n),
            CellValue::Boolean(b) => Value::Bool(*b),
            CellValue::Date(Some(dt)) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            CellValue::Date(None) => Value::Null,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", value_accessor::format_number(*n)),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Date(Some(dt)) => write!(f, "{}", dt.to_rfc3339()),
            CellValue::Date(None) => write!(f, "Invalid Date"),
        }
    }
}

/// Display formatter: resolved value (or `None` when missing) to cell text
pub type Formatter = Arc<dyn Fn(Option<&Value>) -> String + Send + Sync>;

/// Edit validator: returns false to reject a parsed value
pub type Validator = Arc<dyn Fn(&CellValue) -> bool + Send + Sync>;

/// Column metadata describing how one field of a row is shown, searched,
/// filtered, sorted and edited
#[derive(Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub filterable: bool,
    #[serde(default = "default_true")]
    pub searchable: bool,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default, rename = "type")]
    pub column_type: ColumnType,
    #[serde(skip)]
    pub formatter: Option<Formatter>,
    #[serde(skip)]
    pub validator: Option<Validator>,
}

fn default_true() -> bool {
    true
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: true,
            filterable: true,
            searchable: true,
            editable: true,
            column_type: ColumnType::String,
            formatter: None,
            validator: None,
        }
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn with_searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(Option<&Value>) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&CellValue) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Display text for a cell, going through the formatter when present
    pub fn format(&self, row: &Value) -> String {
        let value = value_accessor::resolve(row, &self.key);
        match &self.formatter {
            Some(formatter) => formatter(value),
            None => value_accessor::to_text(value),
        }
    }

    /// Run the validator, accepting everything when none is set
    pub fn validate(&self, value: &CellValue) -> bool {
        self.validator.as_ref().map_or(true, |validator| validator(value))
    }
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("type", &self.column_type)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("searchable", &self.searchable)
            .field("editable", &self.editable)
            .field("formatter", &self.formatter.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Find a column by key
pub fn find_column<'a>(columns: &'a [ColumnDef], key: &str) -> Option<&'a ColumnDef> {
    columns.iter().find(|c| c.key == key)
}
