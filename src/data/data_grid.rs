//! The grid: rows and column metadata plus the view state built over them
//!
//! Every input change re-runs the whole pipeline
//! `search -> filters -> sort -> paginate`. Derived state is kept as index
//! vectors into the backing rows, in the same way a view keeps visible row
//! indices over an immutable table, so nothing is cloned per recompute
//! except `Arc` handles when callers ask for rows.

use crate::config::config::GridConfig;
use crate::data::column::{find_column, ColumnDef};
use crate::data::data_exporter::{DataExporter, ExportFormat};
use crate::data::edit_session::{CommitOutcome, EditSession, EditState};
use crate::data::filter::{Filter, FilterOperator, FilterSet};
use crate::data::pagination::{paginate, PaginationState, DEFAULT_PAGE_SIZE};
use crate::data::row::{Row, RowIdentity};
use crate::data::search::SearchFilter;
use crate::data::selection::{SelectionMode, SelectionTracker};
use crate::data::sort::{sort_indices, SortState};
use crate::state::dispatcher::{EventBus, GridSubscriber};
use crate::state::events::GridEvent;
use anyhow::{anyhow, bail, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub struct DataGrid {
    rows: Vec<Row>,
    columns: Vec<ColumnDef>,

    query: String,
    filters: FilterSet,
    sort: SortState,
    pagination: PaginationState,
    selection: SelectionTracker,
    edit: EditSession,
    editable: bool,

    /// Search + filter survivors, natural order
    filtered: Vec<usize>,
    /// `filtered` after sorting
    sorted: Vec<usize>,
    /// The current page of `sorted`
    displayed: Vec<usize>,

    events: EventBus,
}

impl DataGrid {
    /// Create a grid with default paging, no selection and editing off
    pub fn new(columns: Vec<ColumnDef>, rows: Vec<Row>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.key.as_str()) {
                bail!("Duplicate column key '{}'", column.key);
            }
        }

        let mut grid = Self {
            rows,
            columns,
            query: String::new(),
            filters: FilterSet::new(),
            sort: SortState::default(),
            pagination: PaginationState::new(DEFAULT_PAGE_SIZE),
            selection: SelectionTracker::new(SelectionMode::None),
            edit: EditSession::new(),
            editable: false,
            filtered: Vec::new(),
            sorted: Vec::new(),
            displayed: Vec::new(),
            events: EventBus::new(),
        };
        grid.recompute();
        info!(
            target: "grid",
            "Created grid with {} columns and {} rows",
            grid.columns.len(),
            grid.rows.len()
        );
        Ok(grid)
    }

    /// Create a grid using the paging, selection and editing defaults of `config`
    pub fn with_config(
        columns: Vec<ColumnDef>,
        rows: Vec<Row>,
        config: &GridConfig,
    ) -> Result<Self> {
        let mut grid = Self::new(columns, rows)?;
        grid.pagination.set_page_size(config.display.page_size);
        grid.selection.set_mode(config.behavior.selection_mode);
        if let Some(key) = &config.behavior.row_key {
            grid.selection.set_identity(RowIdentity::field(key.clone()));
        }
        grid.editable = config.behavior.editable;
        grid.recompute();
        Ok(grid)
    }

    /// Re-run search, filters, sort and paging over the current inputs
    fn recompute(&mut self) {
        let searched = SearchFilter::apply(&self.rows, &self.query, &self.columns);
        let filtered = self.filters.apply(&self.rows, searched, &self.columns);
        let sorted = sort_indices(&self.rows, filtered.clone(), &self.sort, &self.columns);

        self.pagination.set_total(filtered.len());
        let displayed =
            paginate(&sorted, self.pagination.page, self.pagination.page_size).to_vec();

        // The editor addresses a position on the page, which now holds another row
        if displayed != self.displayed && self.edit.cancel() {
            debug!(target: "edit", "Displayed page changed, closing editor");
        }

        self.filtered = filtered;
        self.sorted = sorted;
        self.displayed = displayed;

        debug!(
            target: "grid",
            "Recomputed: {} of {} rows match, page {}/{} shows {}",
            self.filtered.len(),
            self.rows.len(),
            self.pagination.page + 1,
            self.pagination.page_count(),
            self.displayed.len()
        );
    }

    fn emit(&mut self, event: GridEvent) {
        self.events.dispatch(event);
    }

    fn emit_selection(&mut self) {
        let snapshot = self.selection.selected().to_vec();
        self.emit(GridEvent::SelectionChanged(snapshot));
    }

    fn emit_filters(&mut self) {
        let snapshot = self.filters.filters().to_vec();
        self.emit(GridEvent::FilterChanged(snapshot));
    }

    fn emit_page(&mut self) {
        let state = self.pagination;
        self.emit(GridEvent::PageChanged(state));
    }

    fn require_column(&self, key: &str) -> Result<&ColumnDef> {
        find_column(&self.columns, key).ok_or_else(|| anyhow!("Unknown column '{}'", key))
    }

    // ---- Rows ----

    /// Replace the backing rows. Selection is kept; the view is rebuilt.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        info!(target: "grid", "Replacing {} rows with {}", self.rows.len(), rows.len());
        self.rows = rows;
        self.edit.cancel();
        self.recompute();
    }

    // ---- Search and filters ----

    /// Set the free-text query. A change returns to the first page.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query == self.query {
            return;
        }
        debug!(target: "filter", "Search query set to '{}'", query);
        self.query = query;
        self.pagination.page = 0;
        self.recompute();
    }

    /// Set or replace the filter on `column`. An empty value removes it.
    pub fn set_filter(
        &mut self,
        column: &str,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Result<()> {
        self.apply_filter(Filter::new(column, operator, value))
    }

    /// Set or replace a column filter given as a whole
    pub fn apply_filter(&mut self, filter: Filter) -> Result<()> {
        let column = self.require_column(&filter.column)?;
        if !column.filterable {
            warn!(target: "filter", "Column '{}' is not filterable", filter.column);
            return Ok(());
        }

        if self.filters.set(filter) {
            self.pagination.page = 0;
            self.recompute();
            self.emit_filters();
        }
        Ok(())
    }

    pub fn remove_filter(&mut self, column: &str) {
        if self.filters.remove(column) {
            self.pagination.page = 0;
            self.recompute();
            self.emit_filters();
        }
    }

    pub fn clear_filters(&mut self) {
        if self.filters.clear() {
            self.pagination.page = 0;
            self.recompute();
            self.emit_filters();
        }
    }

    // ---- Sorting ----

    /// Header click: cycle `column` through ascending, descending and unsorted
    pub fn toggle_sort(&mut self, column: &str) -> Result<()> {
        if !self.require_column(column)?.sortable {
            debug!(target: "sort", "Column '{}' is not sortable", column);
            return Ok(());
        }
        let next = self.sort.cycled(column);
        self.set_sort_state(next);
        Ok(())
    }

    /// Set the sort explicitly
    pub fn set_sort(&mut self, sort: SortState) -> Result<()> {
        if sort.is_active() && !self.require_column(&sort.column)?.sortable {
            debug!(target: "sort", "Column '{}' is not sortable", sort.column);
            return Ok(());
        }
        self.set_sort_state(sort);
        Ok(())
    }

    fn set_sort_state(&mut self, sort: SortState) {
        if sort == self.sort {
            return;
        }
        info!(target: "sort", "Sort changed to {:?} on '{}'", sort.direction, sort.column);
        self.sort = sort;
        self.recompute();
        let state = self.sort.clone();
        self.emit(GridEvent::SortChanged(state));
    }

    // ---- Paging ----

    /// Move to a zero-based page, clamped into range. Returns true if moved.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if !self.pagination.go_to_page(page) {
            return false;
        }
        self.recompute();
        self.emit_page();
        true
    }

    /// Change rows per page (minimum one) and return to the first page
    pub fn set_page_size(&mut self, page_size: usize) {
        let before = self.pagination;
        self.pagination.set_page_size(page_size);
        self.recompute();
        if self.pagination != before {
            self.emit_page();
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.pagination.page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        match self.pagination.page.checked_sub(1) {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    pub fn first_page(&mut self) -> bool {
        self.go_to_page(0)
    }

    pub fn last_page(&mut self) -> bool {
        self.go_to_page(self.pagination.max_page())
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count()
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination.has_next_page()
    }

    pub fn has_previous_page(&self) -> bool {
        self.pagination.has_previous_page()
    }

    pub fn range_label(&self) -> String {
        self.pagination.range_label()
    }

    // ---- Selection ----

    /// Change the selection mode. Any current selection is dropped.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        if self.selection.set_mode(mode) {
            self.emit_selection();
        }
    }

    /// Change how rows are recognised as the same row
    pub fn set_row_identity(&mut self, identity: RowIdentity) {
        let before = self.selection.len();
        self.selection.set_identity(identity);
        if self.selection.len() != before {
            self.emit_selection();
        }
    }

    pub fn toggle_row(&mut self, row: &Row) {
        if self.selection.toggle_row(row) {
            debug!(target: "selection", "{} row(s) selected", self.selection.len());
            self.emit_selection();
        }
    }

    /// Toggle the row at a position on the displayed page
    pub fn toggle_row_at(&mut self, display_index: usize) -> bool {
        let Some(row) = self.row_at(display_index).cloned() else {
            return false;
        };
        let changed = self.selection.toggle_row(&row);
        if changed {
            self.emit_selection();
        }
        changed
    }

    /// Header checkbox: select or deselect every row on the displayed page
    pub fn toggle_select_all(&mut self) {
        let page_rows = self.displayed_rows();
        if self.selection.toggle_select_all(&page_rows) {
            self.emit_selection();
        }
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(&self.displayed_rows())
    }

    pub fn is_indeterminate(&self) -> bool {
        self.selection.is_indeterminate(&self.displayed_rows())
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.emit_selection();
        }
    }

    // ---- Editing ----

    /// Turn inline editing on or off. Turning it off closes any open editor.
    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
        if !editable {
            self.edit.cancel();
        }
    }

    /// Open the cell at a page position for editing. Returns whether it opened.
    pub fn start_edit(&mut self, display_index: usize, column_key: &str) -> bool {
        if !self.editable {
            debug!(target: "edit", "Editing is disabled");
            return false;
        }
        if !find_column(&self.columns, column_key).is_some_and(|c| c.editable) {
            debug!(target: "edit", "Column '{}' is missing or read-only", column_key);
            return false;
        }
        if display_index >= self.displayed.len() {
            debug!(target: "edit", "Row {} is not on the current page", display_index);
            return false;
        }
        self.edit.start(display_index, column_key);
        true
    }

    /// Commit the open editor with the raw input text.
    ///
    /// Rejected values leave the row untouched and emit nothing.
    pub fn commit_edit(&mut self, raw: &str) -> CommitOutcome {
        let Some(target) = self.edit.target().cloned() else {
            return CommitOutcome::NotEditing;
        };
        let (Some(&backing), Some(column)) = (
            self.displayed.get(target.row_index),
            find_column(&self.columns, &target.column_key),
        ) else {
            warn!(target: "edit", "Edit target {:?} no longer exists", target);
            self.edit.cancel();
            return CommitOutcome::NotEditing;
        };

        let original = self.rows[backing].clone();
        let outcome = self.edit.commit(&original, column, raw);
        if let CommitOutcome::Committed(edit) = &outcome {
            self.rows[backing] = edit.row.clone();
            let reselected = self.selection.replace(&original, &edit.row);
            self.recompute();
            self.emit(GridEvent::CellEdited(edit.clone()));
            if reselected {
                self.emit_selection();
            }
        }
        outcome
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.edit.cancel()
    }

    // ---- Deletion ----

    /// Remove the row at a page position from the backing rows.
    ///
    /// The row also leaves the selection. `RowDeleted` carries the row's
    /// former index in the backing rows.
    pub fn delete_row(&mut self, display_index: usize) -> Result<Row> {
        let Some(&backing) = self.displayed.get(display_index) else {
            bail!(
                "Row {} is not on the current page ({} rows shown)",
                display_index,
                self.displayed.len()
            );
        };

        let row = self.rows.remove(backing);
        let identity = self.selection.identity().clone();
        let deselected = self.selection.retain(|selected| !identity.same(selected, &row));
        self.edit.cancel();
        self.recompute();

        info!(target: "grid", "Deleted row {} ({} left)", backing, self.rows.len());
        self.emit(GridEvent::RowDeleted {
            row: row.clone(),
            index: backing,
        });
        if deselected {
            self.emit_selection();
        }
        Ok(row)
    }

    // ---- Export and refresh ----

    /// Serialize every search and filter survivor, in natural order
    pub fn export(&mut self, format: ExportFormat) -> Result<String> {
        let rows = self.filtered_rows();
        self.export_rows(format, &rows)
    }

    /// Serialize the selected rows, in selection order
    pub fn export_selected(&mut self, format: ExportFormat) -> Result<String> {
        let rows = self.selection.selected().to_vec();
        self.export_rows(format, &rows)
    }

    fn export_rows(&mut self, format: ExportFormat, rows: &[Row]) -> Result<String> {
        let content = DataExporter::export(format, rows, &self.columns)?;
        info!(target: "export", "Exported {} rows as {}", rows.len(), format);
        self.emit(GridEvent::ExportRequested {
            format,
            mime_type: format.mime_type(),
            row_count: rows.len(),
            content: content.clone(),
        });
        Ok(content)
    }

    /// Ask observers to reload data
    pub fn request_refresh(&mut self) {
        self.emit(GridEvent::RefreshRequested);
    }

    // ---- Observers ----

    pub fn subscribe(&mut self, subscriber: Box<dyn GridSubscriber>) {
        self.events.subscribe(subscriber);
    }

    pub fn subscribe_fn<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(&GridEvent) + 'static,
    {
        self.events.subscribe_fn(name, handler);
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ---- Accessors ----

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows on the current page, in display order
    pub fn displayed_rows(&self) -> Vec<Row> {
        self.displayed.iter().map(|&i| self.rows[i].clone()).collect()
    }

    /// Search and filter survivors in natural order
    pub fn filtered_rows(&self) -> Vec<Row> {
        self.filtered.iter().map(|&i| self.rows[i].clone()).collect()
    }

    /// Search and filter survivors in sorted order, across all pages
    pub fn sorted_rows(&self) -> Vec<Row> {
        self.sorted.iter().map(|&i| self.rows[i].clone()).collect()
    }

    pub fn row_at(&self, display_index: usize) -> Option<&Row> {
        self.displayed.get(display_index).map(|&i| &self.rows[i])
    }

    /// Backing index of a page position
    pub fn backing_index(&self, display_index: usize) -> Option<usize> {
        self.displayed.get(display_index).copied()
    }

    pub fn total(&self) -> usize {
        self.filtered.len()
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn selected_rows(&self) -> &[Row] {
        self.selection.selected()
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    pub fn edit_state(&self) -> &EditState {
        self.edit.state()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }
}
