use crate::data::column::ColumnDef;
use crate::data::row::Row;
use crate::data::value_accessor::{resolve, to_text};
use serde_json::Value;
use tracing::debug;

/// Free-text search across every searchable column
pub struct SearchFilter;

impl SearchFilter {
    /// True when any searchable column contains the query (case-insensitive).
    ///
    /// Values are compared unformatted. A blank query matches every row;
    /// otherwise surrounding whitespace is part of the needle.
    pub fn matches(row: &Value, query: &str, columns: &[ColumnDef]) -> bool {
        if query.trim().is_empty() {
            return true;
        }
        Self::matches_lowercase(row, &query.to_lowercase(), columns)
    }

    fn matches_lowercase(row: &Value, needle: &str, columns: &[ColumnDef]) -> bool {
        columns
            .iter()
            .filter(|c| c.searchable)
            .any(|c| to_text(resolve(row, &c.key)).to_lowercase().contains(needle))
    }

    /// Indices of all rows matching the query, in input order
    pub fn apply(rows: &[Row], query: &str, columns: &[ColumnDef]) -> Vec<usize> {
        if query.trim().is_empty() {
            return (0..rows.len()).collect();
        }
        let needle = query.to_lowercase();

        let matched: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| Self::matches_lowercase(row, &needle, columns))
            .map(|(idx, _)| idx)
            .collect();
        debug!(
            target: "grid",
            "Search {:?} matched {} of {} rows",
            query,
            matched.len(),
            rows.len()
        );
        matched
    }
}
