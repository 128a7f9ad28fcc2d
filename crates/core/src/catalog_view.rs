//! Browse state of a catalog table: search, column filters, single-column
//! sort and 1-based paging.
//!
//! Pure state; the console's catalog browser drives fetches from it.

use std::collections::BTreeMap;

use crate::models::catalog::{CatalogDataQuery, SortOrder};
use crate::pagination::{self, DEFAULT_CATALOG_PAGE_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogView {
    search: String,
    filters: BTreeMap<String, String>,
    sort: Option<(String, SortOrder)>,
    /// 1-based, as shown to the operator.
    page: u32,
    page_size: u32,
}

impl Default for CatalogView {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_PAGE_SIZE)
    }
}

impl CatalogView {
    pub fn new(page_size: u32) -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn sort(&self) -> Option<(&str, SortOrder)> {
        self.sort.as_ref().map(|(c, o)| (c.as_str(), *o))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.page = 1;
    }

    /// Set or clear (empty value) one column filter.
    pub fn set_filter(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        if value.trim().is_empty() {
            self.filters.remove(&column);
        } else {
            self.filters.insert(column, value);
        }
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }

    /// Header click: the active column flips direction, any other column
    /// becomes the sort column ascending.
    pub fn toggle_sort(&mut self, column: impl Into<String>) {
        let column = column.into();
        self.sort = match self.sort.take() {
            Some((current, order)) if current == column => Some((current, order.flipped())),
            _ => Some((column, SortOrder::Asc)),
        };
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Backend query for the current state (0-based page).
    pub fn query(&self) -> CatalogDataQuery {
        let search = self.search.trim();
        CatalogDataQuery {
            page: pagination::to_backend_page(self.page),
            page_size: self.page_size,
            search: (!search.is_empty()).then(|| search.to_string()),
            sort_by: self.sort.as_ref().map(|(c, _)| c.clone()),
            sort_order: self.sort.as_ref().map(|(_, o)| *o),
            filters: self.filters.clone(),
        }
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        pagination::total_pages(total_count, self.page_size as u64)
    }

    pub fn show_pagination(&self, total_count: u64) -> bool {
        pagination::show_pagination(total_count, self.page_size as u64)
    }
}
