//! Pagination for the RF record listing (100 rows/page)

/// Rows per listing page
pub const PAGE_SIZE: i64 = 100;

/// Page position within a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number, always valid for the listing
    pub page: i64,
    /// Zero for an empty listing
    pub total_pages: i64,
    /// Row offset for `LIMIT/OFFSET`
    pub offset: i64,
}

/// Clamp the requested page to [1, total_pages] and compute its offset
///
/// # Examples
/// ```
/// use rfdash_ui::pagination::calculate_pagination;
///
/// // 250 records: pages of 100, 100 and 50
/// let p = calculate_pagination(250, 99);
/// assert_eq!((p.page, p.total_pages, p.offset), (3, 3, 200));
/// ```
pub fn calculate_pagination(total_records: i64, requested_page: i64) -> Pagination {
    let total_pages = (total_records.max(0) + PAGE_SIZE - 1) / PAGE_SIZE;
    let page = requested_page.clamp(1, total_pages.max(1));

    Pagination {
        page,
        total_pages,
        offset: (page - 1) * PAGE_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total: i64, requested: i64) -> (i64, i64, i64) {
        let p = calculate_pagination(total, requested);
        (p.page, p.total_pages, p.offset)
    }

    #[test]
    fn test_in_range_pages() {
        assert_eq!(page(250, 1), (1, 3, 0));
        assert_eq!(page(250, 2), (2, 3, 100));
        assert_eq!(page(200, 2), (2, 2, 100));
    }

    #[test]
    fn test_out_of_range_pages_clamped() {
        assert_eq!(page(150, 99), (2, 2, 100));
        assert_eq!(page(150, 0), (1, 2, 0));
        assert_eq!(page(150, -5), (1, 2, 0));
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(page(0, 1), (1, 0, 0));
        assert_eq!(page(0, 7), (1, 0, 0));
    }
}
