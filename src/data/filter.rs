//! Per-column typed filters
//!
//! A filter is an operator plus a text operand applied to one column. The
//! operand is interpreted according to the column's declared type. Filters
//! with an empty operand are inactive and match everything; filters that
//! cannot be evaluated (non-numeric operand on a number column, unparseable
//! dates) fail closed and match nothing.

use crate::data::column::{find_column, ColumnDef, ColumnType};
use crate::data::row::Row;
use crate::data::value_accessor::{self, to_bool, to_number, to_text, to_timestamp};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            FilterOperator::Gt => ordering == Ordering::Greater,
            FilterOperator::Gte => ordering != Ordering::Less,
            FilterOperator::Lt => ordering == Ordering::Less,
            FilterOperator::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }
}

impl FromStr for FilterOperator {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "equals" | "eq" | "=" | "==" => Ok(FilterOperator::Equals),
            "contains" => Ok(FilterOperator::Contains),
            "startsWith" | "starts_with" => Ok(FilterOperator::StartsWith),
            "endsWith" | "ends_with" => Ok(FilterOperator::EndsWith),
            "gt" | ">" => Ok(FilterOperator::Gt),
            "gte" | ">=" => Ok(FilterOperator::Gte),
            "lt" | "<" => Ok(FilterOperator::Lt),
            "lte" | "<=" => Ok(FilterOperator::Lte),
            other => Err(anyhow!("Unknown filter operator '{}'", other)),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One column predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: String,
    pub operator: FilterOperator,
}

impl Filter {
    pub fn new(
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            operator,
        }
    }

    /// An empty operand means the filter is switched off
    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }

    /// Evaluate this predicate against one resolved value
    pub fn matches(&self, value: Option<&Value>, column_type: ColumnType) -> bool {
        if !self.is_active() {
            return true;
        }
        // Missing and null values never satisfy an active filter
        if matches!(value, None | Some(Value::Null)) {
            return false;
        }

        let operand = self.value.as_str();
        match self.operator {
            FilterOperator::Equals if column_type == ColumnType::Boolean => {
                // Only the exact operand "true" means true. Cell values still go
                // through `to_bool`, so a stored "false" or "no" string reads as false.
                to_bool(value) == (operand == "true")
            }
            FilterOperator::Equals => to_text(value).to_lowercase() == operand.to_lowercase(),
            FilterOperator::Contains => to_text(value)
                .to_lowercase()
                .contains(&operand.to_lowercase()),
            FilterOperator::StartsWith => to_text(value)
                .to_lowercase()
                .starts_with(&operand.to_lowercase()),
            FilterOperator::EndsWith => to_text(value)
                .to_lowercase()
                .ends_with(&operand.to_lowercase()),
            op => compare_for_type(value, operand, column_type).is_some_and(|ord| op.accepts(ord)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.column, self.operator, self.value)
    }
}

/// Ordering between a cell value and an operand, or `None` when the two
/// cannot be compared (NaN, invalid dates)
fn compare_for_type(
    value: Option<&Value>,
    operand: &str,
    column_type: ColumnType,
) -> Option<Ordering> {
    match column_type {
        ColumnType::Number => {
            let left = to_number(value);
            let right = value_accessor::parse_number(operand);
            left.partial_cmp(&right)
        }
        ColumnType::Date => {
            let left = to_timestamp(value)?;
            let right = value_accessor::parse_datetime(operand)?.timestamp_millis();
            Some(left.cmp(&right))
        }
        _ => Some(to_text(value).to_lowercase().cmp(&operand.to_lowercase())),
    }
}

/// The active filters of a grid, at most one per column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the filter for a column. An empty operand removes it.
    ///
    /// Returns true when the set changed.
    pub fn set(&mut self, filter: Filter) -> bool {
        if !filter.is_active() {
            return self.remove(&filter.column);
        }

        match self.filters.iter_mut().find(|f| f.column == filter.column) {
            Some(existing) if *existing == filter => false,
            Some(existing) => {
                *existing = filter;
                true
            }
            None => {
                self.filters.push(filter);
                true
            }
        }
    }

    /// Remove the filter for a column. Returns true when one was removed.
    pub fn remove(&mut self, column: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.column != column);
        before != self.filters.len()
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.filters.is_empty();
        self.filters.clear();
        changed
    }

    pub fn get(&self, column: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.column == column)
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True when the row passes every active filter
    pub fn matches_row(&self, row: &Value, columns: &[ColumnDef]) -> bool {
        self.filters.iter().all(|filter| {
            let column_type = find_column(columns, &filter.column)
                .map(|c| c.column_type)
                .unwrap_or_default();
            filter.matches(value_accessor::resolve(row, &filter.column), column_type)
        })
    }

    /// Keep the indices of rows passing every filter, in input order
    pub fn apply(&self, rows: &[Row], indices: Vec<usize>, columns: &[ColumnDef]) -> Vec<usize> {
        if self.filters.is_empty() {
            return indices;
        }
        let before = indices.len();
        let kept: Vec<usize> = indices
            .into_iter()
            .filter(|&idx| self.matches_row(&rows[idx], columns))
            .collect();
        debug!(
            target: "filter",
            "{} filter(s) kept {} of {} rows",
            self.filters.len(),
            kept.len(),
            before
        );
        kept
    }
}

/// Parse the compact `column:operator:value` form used on the command line
pub fn parse_filter_spec(spec: &str) -> Result<Filter> {
    let mut parts = spec.splitn(3, ':');
    let column = parts.next().filter(|c| !c.is_empty());
    let operator = parts.next();
    let value = parts.next();
    match (column, operator, value) {
        (Some(column), Some(operator), Some(value)) => {
            Ok(Filter::new(column, operator.parse()?, value))
        }
        _ => Err(anyhow!(
            "Invalid filter '{}', expected column:operator:value",
            spec
        )),
    }
}
