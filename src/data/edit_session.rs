//! Inline cell editing
//!
//! At most one cell is open for editing. Opening another cell silently
//! drops the previous one. A commit parses the raw input for the column
//! type, runs the column validator and, when accepted, produces a new copy
//! of the row carrying the edited value. Rejected commits change nothing.

use crate::data::column::{CellValue, ColumnDef};
use crate::data::row::Row;
use crate::data::value_accessor::{assign, resolve};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// The cell currently being edited, addressed on the displayed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    /// Position on the displayed page
    pub row_index: usize,
    pub column_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing(EditTarget),
}

/// A committed change, as published to observers
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    /// The replacement row holding the new value
    pub row: Row,
    pub column: String,
    pub old_value: Value,
    pub new_value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed(CellEdit),
    /// The validator refused the value; the editor should show `old_value` again
    Rejected { old_value: Value },
    NotEditing,
}

#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: EditState,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn target(&self) -> Option<&EditTarget> {
        match &self.state {
            EditState::Editing(target) => Some(target),
            EditState::Idle => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    pub fn is_editing_cell(&self, row_index: usize, column_key: &str) -> bool {
        self.target()
            .is_some_and(|t| t.row_index == row_index && t.column_key == column_key)
    }

    /// Open a cell. Any uncommitted edit is discarded without validation.
    pub fn start(&mut self, row_index: usize, column_key: impl Into<String>) {
        let target = EditTarget {
            row_index,
            column_key: column_key.into(),
        };
        if let EditState::Editing(previous) = &self.state {
            debug!(target: "edit", "Discarding uncommitted edit at {:?}", previous);
        }
        debug!(target: "edit", "Editing row {} column {}", target.row_index, target.column_key);
        self.state = EditState::Editing(target);
    }

    /// Close the editor without touching data
    pub fn cancel(&mut self) -> bool {
        let was_editing = self.is_editing();
        self.state = EditState::Idle;
        was_editing
    }

    /// Validate `raw` for `column` and build the edited copy of `row`.
    ///
    /// The session returns to idle whatever the outcome.
    pub fn commit(&mut self, row: &Row, column: &ColumnDef, raw: &str) -> CommitOutcome {
        if !self.is_editing() {
            return CommitOutcome::NotEditing;
        }
        self.state = EditState::Idle;

        let old_value = resolve(row, &column.key).cloned().unwrap_or(Value::Null);
        let parsed = CellValue::parse(raw, column.column_type);
        if !column.validate(&parsed) {
            info!(target: "edit", "Rejected {} for column {}", parsed, column.key);
            return CommitOutcome::Rejected { old_value };
        }

        let new_value = parsed.to_json();
        let updated: Row = Arc::new(assign(row, &column.key, new_value.clone()));
        debug!(
            target: "edit",
            "Committed {}: {} -> {}",
            column.key,
            old_value,
            new_value
        );
        CommitOutcome::Committed(CellEdit {
            row: updated,
            column: column.key.clone(),
            old_value,
            new_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::column::ColumnType;
    use serde_json::json;

    fn age_column() -> ColumnDef {
        ColumnDef::new("age", "Age")
            .with_type(ColumnType::Number)
            .with_validator(|v| v.as_f64().is_some_and(|n| n >= 0.0))
    }

    #[test]
    fn test_start_replaces_previous_target() {
        let mut session = EditSession::new();
        session.start(0, "age");
        session.start(2, "name");
        assert!(session.is_editing_cell(2, "name"));
        assert!(!session.is_editing_cell(0, "age"));
    }

    #[test]
    fn test_commit_produces_new_row() {
        let row: Row = Arc::new(json!({"id": 1, "age": 30}));
        let mut session = EditSession::new();
        session.start(0, "age");

        let outcome = session.commit(&row, &age_column(), "31");
        let CommitOutcome::Committed(edit) = outcome else {
            panic!("expected commit, got {:?}", outcome);
        };
        assert_eq!(edit.old_value, json!(30));
        assert_eq!(edit.new_value, json!(31));
        assert_eq!(edit.row["age"], json!(31));
        assert!(!Arc::ptr_eq(&edit.row, &row));
        assert_eq!(row["age"], json!(30));
        assert!(!session.is_editing());
    }

    #[test]
    fn test_rejected_commit_keeps_old_value() {
        let row: Row = Arc::new(json!({"id": 1, "age": 30}));
        let mut session = EditSession::new();
        session.start(0, "age");

        let outcome = session.commit(&row, &age_column(), "-5");
        assert_eq!(outcome, CommitOutcome::Rejected { old_value: json!(30) });
        assert_eq!(row["age"], json!(30));
        assert!(!session.is_editing());
    }

    #[test]
    fn test_commit_when_idle() {
        let row: Row = Arc::new(json!({"age": 30}));
        let mut session = EditSession::new();
        assert_eq!(
            session.commit(&row, &age_column(), "1"),
            CommitOutcome::NotEditing
        );
    }

    #[test]
    fn test_cancel() {
        let mut session = EditSession::new();
        assert!(!session.cancel());
        session.start(1, "age");
        assert!(session.cancel());
        assert_eq!(session.state(), &EditState::Idle);
    }

    #[test]
    fn test_non_numeric_input_without_validator_stores_null() {
        let row: Row = Arc::new(json!({"age": 30}));
        let column = ColumnDef::new("age", "Age").with_type(ColumnType::Number);
        let mut session = EditSession::new();
        session.start(0, "age");
        match session.commit(&row, &column, "lots") {
            CommitOutcome::Committed(edit) => assert_eq!(edit.new_value, Value::Null),
            other => panic!("expected commit, got {:?}", other),
        }
    }
}
