//! Page slicing for listings and back-office tables.

use serde::{Deserialize, Serialize};

/// Upper bound on items per page.
pub const MAX_PER_PAGE: usize = 100;

/// A requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    /// Build a request, clamping `per_page` to `1..=MAX_PER_PAGE` and
    /// `page` to at least 1.
    #[must_use]
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 12)
    }
}

/// One page of results plus the numbers needed to render a pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    /// `ceil(total_items / per_page)`; zero when there are no items.
    pub total_pages: usize,
    pub total_items: usize,
    pub per_page: usize,
}

impl<T> Paginated<T> {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    #[must_use]
    pub const fn previous_page(&self) -> usize {
        self.current_page.saturating_sub(1)
    }

    #[must_use]
    pub const fn next_page(&self) -> usize {
        self.current_page + 1
    }

    /// Page numbers to show in the pager: at most `window` pages centred on
    /// the current one.
    #[must_use]
    pub fn page_numbers(&self, window: usize) -> Vec<usize> {
        if self.total_pages == 0 || window == 0 {
            return Vec::new();
        }
        let window = window.min(self.total_pages);
        let half = window / 2;
        let start = self
            .current_page
            .saturating_sub(half)
            .clamp(1, self.total_pages + 1 - window);
        (start..start + window).collect()
    }

    /// Transform the items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            per_page: self.per_page,
        }
    }
}

/// Slice `items` to the requested page.
///
/// Pages past the end clamp to the last page.
#[must_use]
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Paginated<T> {
    let request = PageRequest::new(request.page, request.per_page);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(request.per_page);
    let current_page = request.page.min(total_pages.max(1));
    let offset = (current_page - 1) * request.per_page;

    let items = items
        .into_iter()
        .skip(offset)
        .take(request.per_page)
        .collect();

    Paginated {
        items,
        current_page,
        total_pages,
        total_items,
        per_page: request.per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_and_last_page_size() {
        for n in 0..=37_usize {
            for p in 1..=8_usize {
                let items: Vec<usize> = (0..n).collect();
                let expected_pages = n.div_ceil(p);
                let last = paginate(items, PageRequest::new(usize::MAX, p));
                assert_eq!(last.total_pages, expected_pages);
                if n > 0 {
                    let expected_len = if n % p == 0 { p } else { n % p };
                    assert_eq!(last.items.len(), expected_len, "n={n} p={p}");
                    assert_eq!(last.current_page, expected_pages);
                } else {
                    assert!(last.items.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_middle_page_contents() {
        let page = paginate((1..=25).collect::<Vec<_>>(), PageRequest::new(2, 10));
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert!(page.has_previous());
        assert!(page.has_next());
        assert_eq!(page.previous_page(), 1);
        assert_eq!(page.next_page(), 3);
    }

    #[test]
    fn test_request_clamping() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, per_page: 1 });
        assert_eq!(PageRequest::new(3, 500).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_page_numbers_window() {
        let page = paginate((0..100).collect::<Vec<_>>(), PageRequest::new(5, 10));
        assert_eq!(page.page_numbers(5), vec![3, 4, 5, 6, 7]);

        let first = paginate((0..100).collect::<Vec<_>>(), PageRequest::new(1, 10));
        assert_eq!(first.page_numbers(5), vec![1, 2, 3, 4, 5]);

        let last = paginate((0..100).collect::<Vec<_>>(), PageRequest::new(10, 10));
        assert_eq!(last.page_numbers(5), vec![6, 7, 8, 9, 10]);

        let short = paginate((0..15).collect::<Vec<_>>(), PageRequest::new(1, 10));
        assert_eq!(short.page_numbers(5), vec![1, 2]);
    }
}
