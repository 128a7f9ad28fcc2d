use serde::{Deserialize, Serialize};

/// A page of a server-side paginated list.
///
/// Different resource groups spell the envelope differently (`items` or
/// `data`, `total` or `total_count`); all spellings decode into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "data", default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(alias = "total_count", default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` items at this page's size.
    pub fn total_pages(&self) -> u64 {
        crate::pagination::total_pages(self.total, self.page_size as u64)
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 0,
            page_size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_items_and_total() {
        let page: Page<u32> = serde_json::from_value(serde_json::json!({
            "items": [1, 2, 3],
            "total": 25,
            "page": 0,
            "page_size": 10,
        }))
        .unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn decodes_alternate_spellings() {
        let page: Page<u32> = serde_json::from_value(serde_json::json!({
            "data": [7],
            "total_count": 1,
        }))
        .unwrap();
        assert_eq!(page.items, vec![7]);
        assert_eq!(page.total, 1);
    }
}
