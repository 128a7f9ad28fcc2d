//! Page arithmetic shared by every paginated view.
//!
//! Catalog browsing uses 1-based pages in the UI and translates them to the
//! backend's 0-based numbering; queue views are 0-based end to end.

/// Default rows per page for queue views.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default rows per page for catalog browsing.
pub const DEFAULT_CATALOG_PAGE_SIZE: u32 = 20;

/// `ceil(total / page_size)`; zero when `page_size` is zero.
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Pagination controls are hidden when everything fits on one page.
pub fn show_pagination(total: u64, page_size: u64) -> bool {
    total > page_size
}

/// Translate a 1-based UI page into the backend's 0-based page.
pub fn to_backend_page(ui_page: u32) -> u32 {
    ui_page.saturating_sub(1)
}

/// Clamp a 0-based page so it never points past the last page.
pub fn clamp_page(page: u32, total: u64, page_size: u32) -> u32 {
    let pages = total_pages(total, page_size as u64);
    if pages == 0 {
        return 0;
    }
    page.min((pages - 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_is_one_page() {
        assert_eq!(total_pages(20, 20), 1);
        assert!(!show_pagination(20, 20));
    }

    #[test]
    fn remainder_adds_a_page() {
        assert_eq!(total_pages(25, 10), 3);
        assert!(show_pagination(25, 10));
    }

    #[test]
    fn empty_and_zero_size() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 0), 0);
    }

    #[test]
    fn ui_page_translation() {
        assert_eq!(to_backend_page(1), 0);
        assert_eq!(to_backend_page(3), 2);
        assert_eq!(to_backend_page(0), 0);
    }

    #[test]
    fn clamp_page_to_last() {
        assert_eq!(clamp_page(5, 25, 10), 2);
        assert_eq!(clamp_page(1, 25, 10), 1);
        assert_eq!(clamp_page(3, 0, 10), 0);
    }
}
