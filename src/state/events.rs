//! Events published by a grid to its observers

use crate::data::data_exporter::ExportFormat;
use crate::data::edit_session::CellEdit;
use crate::data::filter::Filter;
use crate::data::pagination::PaginationState;
use crate::data::row::Row;
use crate::data::sort::SortState;

/// Something observable changed in the grid
#[derive(Debug, Clone)]
pub enum GridEvent {
    /// Snapshot of the selected rows after a selection change
    SelectionChanged(Vec<Row>),

    /// Sort column or direction changed
    SortChanged(SortState),

    /// The set of active filters changed
    FilterChanged(Vec<Filter>),

    /// Page, page size or total changed through a paging request
    PageChanged(PaginationState),

    /// A cell edit was committed
    CellEdited(CellEdit),

    /// A row was removed from the backing set
    RowDeleted { row: Row, index: usize },

    /// An export was produced
    ExportRequested {
        format: ExportFormat,
        mime_type: &'static str,
        row_count: usize,
        content: String,
    },

    /// The driver asked for data to be reloaded
    RefreshRequested,
}

impl GridEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            GridEvent::SelectionChanged(_) => "selection-changed",
            GridEvent::SortChanged(_) => "sort-changed",
            GridEvent::FilterChanged(_) => "filter-changed",
            GridEvent::PageChanged(_) => "page-changed",
            GridEvent::CellEdited(_) => "cell-edited",
            GridEvent::RowDeleted { .. } => "row-deleted",
            GridEvent::ExportRequested { .. } => "export-requested",
            GridEvent::RefreshRequested => "refresh-requested",
        }
    }
}
