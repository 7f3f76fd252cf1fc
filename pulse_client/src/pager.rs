//! Pagination for the process list view.

/// Process rows shown per page.
pub const PROCESSES_PER_PAGE: usize = 22;

/// Split `items` into pages of at most `per_page` elements.
///
/// The final page may be shorter; an empty slice yields no pages.
#[must_use]
pub fn paginate<T>(items: &[T], per_page: usize) -> Vec<&[T]> {
    if per_page == 0 {
        return Vec::new();
    }
    items.chunks(per_page).collect()
}

/// Tracks the current page of a paginated view and whether the
/// next/previous controls should be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    total: usize,
}

impl Pager {
    /// Create a pager over `total` pages, positioned at the first.
    #[must_use]
    pub const fn new(total: usize) -> Self {
        Self { page: 0, total }
    }

    /// Current page index (0-based).
    #[must_use]
    pub const fn current(&self) -> usize {
        self.page
    }

    /// Total number of pages.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Whether a next page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page + 1 < self.total
    }

    /// Whether a previous page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Advance one page if possible.
    pub fn next(&mut self) {
        if self.has_next() {
            self.page += 1;
        }
    }

    /// Go back one page if possible.
    pub fn previous(&mut self) {
        if self.has_previous() {
            self.page -= 1;
        }
    }

    /// Update the page count (e.g. after a refresh changed the list),
    /// clamping the current page into range.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        if self.page >= total {
            self.page = total.saturating_sub(1);
        }
    }
}
