use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page position over the search+filter result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
    /// Rows surviving search and filters
    pub total: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            total: 0,
        }
    }
}

impl PaginationState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Number of pages, never less than one
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size.max(1)).max(1)
    }

    pub fn max_page(&self) -> usize {
        self.page_count() - 1
    }

    pub fn clamp_page(&self, requested: usize) -> usize {
        requested.min(self.max_page())
    }

    /// Move to a page, clamping out-of-range requests. Returns true if moved.
    pub fn go_to_page(&mut self, requested: usize) -> bool {
        let page = self.clamp_page(requested);
        let changed = page != self.page;
        self.page = page;
        changed
    }

    /// Change the page size; always returns to the first page
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 0;
    }

    /// Update the total and pull the page back into range
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.page = self.clamp_page(self.page);
    }

    pub fn offset(&self) -> usize {
        self.page * self.page_size
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.max_page()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 0
    }

    /// Human-readable position, e.g. "Showing 11-20 of 42"
    pub fn range_label(&self) -> String {
        if self.total == 0 {
            return "No rows".to_string();
        }
        let start = self.offset() + 1;
        let end = (self.offset() + self.page_size).min(self.total);
        format!("Showing {}-{} of {}", start, end, self.total)
    }
}

/// The slice of `items` belonging to one page
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = page.saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}
