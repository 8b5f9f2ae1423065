//! Row selection that survives paging, searching and filtering
//!
//! Selection holds the rows themselves, not display positions, so a row
//! stays selected while it is on another page or hidden by a filter.

use crate::data::row::{Row, RowIdentity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    None,
    Single,
    Multiple,
}

impl FromStr for SelectionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(SelectionMode::None),
            "single" => Ok(SelectionMode::Single),
            "multiple" | "multi" => Ok(SelectionMode::Multiple),
            other => Err(anyhow::anyhow!("Unknown selection mode '{}'", other)),
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::None => write!(f, "none"),
            SelectionMode::Single => write!(f, "single"),
            SelectionMode::Multiple => write!(f, "multiple"),
        }
    }
}

/// Selected rows, kept free of duplicates under the configured identity
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    mode: SelectionMode,
    identity: RowIdentity,
    selected: Vec<Row>,
}

impl SelectionTracker {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switch mode. Any existing selection is dropped.
    pub fn set_mode(&mut self, mode: SelectionMode) -> bool {
        self.mode = mode;
        self.clear()
    }

    pub fn identity(&self) -> &RowIdentity {
        &self.identity
    }

    pub fn set_identity(&mut self, identity: RowIdentity) {
        self.identity = identity;
        self.dedup();
    }

    pub fn selected(&self) -> &[Row] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, row: &Row) -> bool {
        self.position(row).is_some()
    }

    fn position(&self, row: &Row) -> Option<usize> {
        self.selected.iter().position(|s| self.identity.same(s, row))
    }

    /// Toggle one row. Returns true when the selection changed.
    pub fn toggle_row(&mut self, row: &Row) -> bool {
        match self.mode {
            SelectionMode::None => false,
            SelectionMode::Single => {
                // Always `[row]`; reselecting the current row is a no-op
                if self.selected.len() == 1 && self.is_selected(row) {
                    return false;
                }
                self.selected = vec![row.clone()];
                true
            }
            SelectionMode::Multiple => {
                match self.position(row) {
                    Some(pos) => {
                        self.selected.remove(pos);
                    }
                    None => self.selected.push(row.clone()),
                }
                true
            }
        }
    }

    /// Select or deselect every row on the current page.
    ///
    /// Only meaningful in multiple mode. Rows selected on other pages are
    /// left alone.
    pub fn toggle_select_all(&mut self, page_rows: &[Row]) -> bool {
        if self.mode != SelectionMode::Multiple || page_rows.is_empty() {
            return false;
        }

        if self.is_all_selected(page_rows) {
            let identity = self.identity.clone();
            self.selected
                .retain(|s| !page_rows.iter().any(|r| identity.same(s, r)));
            debug!(target: "selection", "Deselected {} page rows", page_rows.len());
        } else {
            for row in page_rows {
                if !self.is_selected(row) {
                    self.selected.push(row.clone());
                }
            }
            debug!(target: "selection", "Selected {} page rows", page_rows.len());
        }
        true
    }

    /// Every row on the page is selected. False for an empty page.
    pub fn is_all_selected(&self, page_rows: &[Row]) -> bool {
        !page_rows.is_empty() && page_rows.iter().all(|r| self.is_selected(r))
    }

    /// Some, but not all, rows on the page are selected
    pub fn is_indeterminate(&self, page_rows: &[Row]) -> bool {
        let count = page_rows.iter().filter(|r| self.is_selected(r)).count();
        count > 0 && count < page_rows.len()
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.selected.is_empty();
        self.selected.clear();
        changed
    }

    /// Drop selected rows failing the predicate. Returns true if any were dropped.
    pub fn retain<F>(&mut self, mut keep: F) -> bool
    where
        F: FnMut(&Row) -> bool,
    {
        let before = self.selected.len();
        self.selected.retain(|r| keep(r));
        before != self.selected.len()
    }

    /// Swap a selected row for its replacement, keeping its position
    pub fn replace(&mut self, old: &Row, new: &Row) -> bool {
        match self.position(old) {
            Some(pos) => {
                self.selected[pos] = new.clone();
                true
            }
            None => false,
        }
    }

    fn dedup(&mut self) {
        let mut unique: Vec<Row> = Vec::with_capacity(self.selected.len());
        for row in self.selected.drain(..) {
            if !unique.iter().any(|u| self.identity.same(u, &row)) {
                unique.push(row);
            }
        }
        self.selected = unique;
    }
}
