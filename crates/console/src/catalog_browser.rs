//! Live browsing of one catalog's rows.
//!
//! [`CatalogBrowser`] owns a [`CatalogView`] and refetches whenever it
//! changes. Search text goes through a debouncer; filter, sort and page
//! changes fetch at once. Every fetch runs in a [`LatestSlot`], so a newer
//! fetch cancels the older one and only the latest state is ever applied.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use civica_client::services::CatalogsService;
use civica_client::ApiError;
use civica_core::catalog_view::CatalogView;
use civica_core::models::{CatalogDataPage, CatalogDataQuery};
use civica_query::{Debouncer, LatestSlot};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Where catalog rows come from.
#[async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    async fn fetch_page(
        &self,
        catalog_id: &str,
        query: &CatalogDataQuery,
    ) -> Result<CatalogDataPage, ApiError>;
}

#[async_trait]
impl CatalogSource for CatalogsService {
    async fn fetch_page(
        &self,
        catalog_id: &str,
        query: &CatalogDataQuery,
    ) -> Result<CatalogDataPage, ApiError> {
        self.data(catalog_id, query).await
    }
}

/// What the browser currently shows.
#[derive(Debug, Clone, Default)]
pub struct BrowserState {
    pub view: CatalogView,
    /// Last page received; kept while a newer fetch is loading or failed.
    pub page: Option<Arc<CatalogDataPage>>,
    pub error: Option<String>,
    pub loading: bool,
}

impl BrowserState {
    pub fn total_pages(&self) -> u64 {
        self.page
            .as_ref()
            .map(|p| self.view.total_pages(p.total_count))
            .unwrap_or(0)
    }

    pub fn show_pagination(&self) -> bool {
        self.page
            .as_ref()
            .is_some_and(|p| self.view.show_pagination(p.total_count))
    }
}

struct Inner {
    source: Arc<dyn CatalogSource>,
    catalog_id: String,
    view: Mutex<CatalogView>,
    slot: LatestSlot,
    state: watch::Sender<BrowserState>,
    cancel: CancellationToken,
}

pub struct CatalogBrowser {
    inner: Arc<Inner>,
    search: Debouncer<String>,
}

impl std::fmt::Debug for CatalogBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogBrowser")
            .field("catalog_id", &self.inner.catalog_id)
            .finish_non_exhaustive()
    }
}

impl CatalogBrowser {
    /// Open the browser and load the first page.
    ///
    /// Background work runs under a child of `parent`; closing the browser
    /// or cancelling `parent` stops it.
    pub fn open(
        source: Arc<dyn CatalogSource>,
        catalog_id: impl Into<String>,
        view: CatalogView,
        debounce: Duration,
        parent: &CancellationToken,
    ) -> Self {
        let cancel = parent.child_token();
        let (state, _) = watch::channel(BrowserState {
            view: view.clone(),
            ..Default::default()
        });
        let inner = Arc::new(Inner {
            source,
            catalog_id: catalog_id.into(),
            view: Mutex::new(view),
            slot: LatestSlot::new(),
            state,
            cancel: cancel.clone(),
        });

        let (search, mut settled) = Debouncer::spawn(debounce, cancel.clone());
        let consumer = inner.clone();
        tokio::spawn(async move {
            loop {
                let text = tokio::select! {
                    _ = consumer.cancel.cancelled() => break,
                    text = settled.recv() => match text {
                        Some(text) => text,
                        None => break,
                    },
                };
                tracing::debug!(catalog_id = %consumer.catalog_id, search = %text, "Search settled");
                consumer.update(|view| view.set_search(text));
            }
        });

        inner.reload();
        Self { inner, search }
    }

    pub fn catalog_id(&self) -> &str {
        &self.inner.catalog_id
    }

    pub fn state(&self) -> BrowserState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BrowserState> {
        self.inner.state.subscribe()
    }

    /// Wait until no fetch is loading and return the settled state.
    pub async fn settled(&self) -> Option<BrowserState> {
        let mut rx = self.subscribe();
        let state = rx.wait_for(|s| !s.loading).await.ok()?;
        Some(state.clone())
    }

    /// Record a keystroke; the search applies once typing pauses.
    pub fn type_search(&self, text: impl Into<String>) {
        self.search.push(text.into());
    }

    pub fn set_filter(&self, column: impl Into<String>, value: impl Into<String>) {
        let (column, value) = (column.into(), value.into());
        self.inner.update(|view| view.set_filter(column, value));
    }

    pub fn clear_filters(&self) {
        self.inner.update(CatalogView::clear_filters);
    }

    pub fn toggle_sort(&self, column: impl Into<String>) {
        let column = column.into();
        self.inner.update(|view| view.toggle_sort(column));
    }

    /// Go to a 1-based page.
    pub fn set_page(&self, page: u32) {
        self.inner.update(|view| view.set_page(page));
    }

    pub fn set_page_size(&self, page_size: u32) {
        self.inner.update(|view| view.set_page_size(page_size));
    }

    pub fn reload(&self) {
        self.inner.reload();
    }

    pub fn close(&self) {
        self.inner.slot.cancel();
        self.inner.cancel.cancel();
    }
}

impl Drop for CatalogBrowser {
    fn drop(&mut self) {
        self.close();
    }
}

impl Inner {
    fn view(&self) -> std::sync::MutexGuard<'_, CatalogView> {
        self.view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(self: &Arc<Self>, change: impl FnOnce(&mut CatalogView)) {
        change(&mut *self.view());
        self.reload();
    }

    /// Mark the state loading and start a fetch that supersedes any other.
    fn reload(self: &Arc<Self>) {
        if self.cancel.is_cancelled() {
            return;
        }
        let view = self.view().clone();
        self.state.send_modify(|s| {
            s.view = view;
            s.loading = true;
        });

        let inner = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = inner.cancel.cancelled() => {}
                _ = inner.load() => {}
            }
        });
    }

    async fn load(&self) {
        // The query is read when the request starts, so a fetch that wins
        // the slot always carries the newest view.
        let fetch = async {
            let view = self.view().clone();
            let query = view.query();
            let result = self.source.fetch_page(&self.catalog_id, &query).await;
            (view, result)
        };
        let Some((view, result)) = self.slot.run(fetch).await else {
            return;
        };

        match result {
            Ok(page) => {
                tracing::debug!(
                    catalog_id = %self.catalog_id,
                    rows = page.rows.len(),
                    total = page.total_count,
                    "Catalog page loaded",
                );
                self.state.send_modify(|s| {
                    s.view = view;
                    s.page = Some(Arc::new(page));
                    s.error = None;
                    s.loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(catalog_id = %self.catalog_id, error = %e, "Catalog fetch failed");
                self.state.send_modify(|s| {
                    s.view = view;
                    s.error = Some(e.message());
                    s.loading = false;
                });
            }
        }
    }
}
