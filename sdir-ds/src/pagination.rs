//! Pagination utilities for the member list
//!
//! The directory shows 30 members per page.

use serde::Serialize;

/// Page size constant for all pagination
pub const PAGE_SIZE: usize = 30;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages (0 when there are no results)
    pub total_pages: usize,
    /// Index of the first record on the page
    pub offset: usize,
    /// One past the index of the last record on the page
    pub end: usize,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, max(total_pages, 1)]
///
/// # Examples
/// ```
/// use sdir_ds::pagination::calculate_pagination;
///
/// // 45 results = 2 pages (30 + 15)
/// let p = calculate_pagination(45, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 2);
/// assert_eq!((p.offset, p.end), (30, 45));
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(45, 99);
/// assert_eq!(p.page, 2);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize) -> Pagination {
    let total_pages = total_results.div_ceil(PAGE_SIZE);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;
    let end = (offset + PAGE_SIZE).min(total_results);

    Pagination {
        page,
        total_pages,
        offset: offset.min(total_results),
        end,
    }
}

/// One entry of the page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageLink {
    Page { number: usize, current: bool },
    /// Ellipsis between non-adjacent pages
    Gap,
}

impl PageLink {
    fn page(number: usize, current: usize) -> Self {
        PageLink::Page {
            number,
            current: number == current,
        }
    }
}

/// Page selector around `current`: first, neighbors, last, with gaps
///
/// Empty when there is at most one page.
pub fn page_links(current: usize, total_pages: usize) -> Vec<PageLink> {
    if total_pages <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let mut links = Vec::new();

    if current > 2 {
        links.push(PageLink::page(1, current));
        if current > 3 {
            links.push(PageLink::Gap);
        }
    }
    if current > 1 {
        links.push(PageLink::page(current - 1, current));
    }
    links.push(PageLink::page(current, current));
    if current < total_pages {
        links.push(PageLink::page(current + 1, current));
    }
    if current + 1 < total_pages {
        if current + 2 < total_pages {
            links.push(PageLink::Gap);
        }
        links.push(PageLink::page(total_pages, current));
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(links: &[PageLink]) -> Vec<Option<usize>> {
        links
            .iter()
            .map(|link| match link {
                PageLink::Page { number, .. } => Some(*number),
                PageLink::Gap => None,
            })
            .collect()
    }

    #[test]
    fn test_pagination_forty_five_records() {
        let p = calculate_pagination(45, 1);
        assert_eq!(p, Pagination { page: 1, total_pages: 2, offset: 0, end: 30 });

        let p = calculate_pagination(45, 2);
        assert_eq!(p, Pagination { page: 2, total_pages: 2, offset: 30, end: 45 });
    }

    #[test]
    fn test_pagination_out_of_bounds_low() {
        let p = calculate_pagination(45, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_out_of_bounds_high() {
        let p = calculate_pagination(45, 3);
        assert_eq!(p.page, 2); // Clamped to last page
        assert_eq!(p.offset, 30);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 4);
        assert_eq!(p, Pagination { page: 1, total_pages: 0, offset: 0, end: 0 });
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = calculate_pagination(60, 2);
        assert_eq!(p.total_pages, 2);
        assert_eq!((p.offset, p.end), (30, 60));
    }

    #[test]
    fn test_page_links_single_page_is_empty() {
        assert!(page_links(1, 0).is_empty());
        assert!(page_links(1, 1).is_empty());
    }

    #[test]
    fn test_page_links_two_pages() {
        let links = page_links(1, 2);
        assert_eq!(numbers(&links), vec![Some(1), Some(2)]);
        assert_eq!(links[0], PageLink::Page { number: 1, current: true });
    }

    #[test]
    fn test_page_links_middle_has_both_gaps() {
        assert_eq!(
            numbers(&page_links(5, 10)),
            vec![Some(1), None, Some(4), Some(5), Some(6), None, Some(10)]
        );
    }

    #[test]
    fn test_page_links_near_edges_skip_gaps() {
        assert_eq!(numbers(&page_links(3, 4)), vec![Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(numbers(&page_links(1, 5)), vec![Some(1), Some(2), None, Some(5)]);
        assert_eq!(numbers(&page_links(5, 5)), vec![Some(1), None, Some(4), Some(5)]);
    }

    #[test]
    fn test_page_link_serialization() {
        let value = serde_json::to_value(PageLink::Gap).unwrap();
        assert_eq!(value["kind"], "gap");
        let value = serde_json::to_value(PageLink::page(2, 2)).unwrap();
        assert_eq!(value["kind"], "page");
        assert_eq!(value["current"], true);
    }
}
