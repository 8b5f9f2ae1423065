//! Single-column, type-aware, stable sorting

use crate::data::column::{find_column, ColumnDef, ColumnType};
use crate::data::row::Row;
use crate::data::value_accessor::{resolve, to_bool, to_number, to_text, to_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
    #[default]
    None,
}

/// Which column the grid is ordered by, if any
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    /// Column key, empty when unsorted
    pub column: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        let column = column.into();
        if column.is_empty() || direction == SortDirection::None {
            return Self::default();
        }
        Self { column, direction }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Asc)
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Desc)
    }

    pub fn is_active(&self) -> bool {
        !self.column.is_empty() && self.direction != SortDirection::None
    }

    /// State after a header click on `column`.
    ///
    /// The same column cycles asc -> desc -> unsorted -> asc; a different
    /// column starts ascending.
    pub fn cycled(&self, column: &str) -> SortState {
        if self.column != column {
            return SortState::ascending(column);
        }
        match self.direction {
            SortDirection::Asc => SortState::descending(column),
            SortDirection::Desc => SortState::default(),
            SortDirection::None => SortState::ascending(column),
        }
    }
}

/// Locale-style string ordering: case-folded first, raw text breaks ties
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Compare two resolved values as values of `column_type`, ascending
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, column_type: ColumnType) -> Ordering {
    match column_type {
        ColumnType::Number => {
            let a = nan_to_zero(to_number(a));
            let b = nan_to_zero(to_number(b));
            a.total_cmp(&b)
        }
        // Unparseable dates sort before every valid one
        ColumnType::Date => to_timestamp(a).cmp(&to_timestamp(b)),
        ColumnType::Boolean => to_bool(a).cmp(&to_bool(b)),
        ColumnType::String | ColumnType::Email | ColumnType::Url => {
            compare_text(&to_text(a), &to_text(b))
        }
    }
}

// total_cmp orders -0.0 before 0.0, so both zeros are normalised too
fn nan_to_zero(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        0.0
    } else {
        n
    }
}

/// Compare two rows under a sort state
pub fn compare(a: &Value, b: &Value, sort: &SortState, column_type: ColumnType) -> Ordering {
    if !sort.is_active() {
        return Ordering::Equal;
    }
    let ordering = compare_values(resolve(a, &sort.column), resolve(b, &sort.column), column_type);
    match sort.direction {
        SortDirection::Desc => ordering.reverse(),
        _ => ordering,
    }
}

/// Order row indices by the sort state. Equal keys keep their input order.
pub fn sort_indices(
    rows: &[Row],
    mut indices: Vec<usize>,
    sort: &SortState,
    columns: &[ColumnDef],
) -> Vec<usize> {
    if !sort.is_active() {
        return indices;
    }
    let Some(column) = find_column(columns, &sort.column) else {
        debug!(target: "sort", "Sort column '{}' is not defined, keeping order", sort.column);
        return indices;
    };

    // slice::sort_by is a stable merge sort
    indices.sort_by(|&a, &b| compare(&rows[a], &rows[b], sort, column.column_type));
    debug!(
        target: "sort",
        "Sorted {} rows by {} {:?}",
        indices.len(),
        sort.column,
        sort.direction
    );
    indices
}
