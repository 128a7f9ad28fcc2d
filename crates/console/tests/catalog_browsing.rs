//! Catalog browsing: debounced search and server-side paging.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use civica_client::ApiError;
use civica_console::{CatalogBrowser, CatalogSource};
use civica_core::catalog_view::CatalogView;
use civica_core::models::{CatalogDataPage, CatalogDataQuery};
use common::{spawn_backend, within};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Counting {
    calls: AtomicUsize,
    queries: Mutex<Vec<CatalogDataQuery>>,
}

#[async_trait]
impl CatalogSource for Counting {
    async fn fetch_page(
        &self,
        _catalog_id: &str,
        query: &CatalogDataQuery,
    ) -> Result<CatalogDataPage, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        Ok(CatalogDataPage {
            total_count: 5,
            page: query.page,
            page_size: query.page_size,
            ..Default::default()
        })
    }
}

#[tokio::test(start_paused = true)]
async fn typing_then_clearing_fetches_at_most_once() {
    let source = Arc::new(Counting::default());
    let browser = CatalogBrowser::open(
        source.clone(),
        "municipios",
        CatalogView::new(20),
        Duration::from_millis(300),
        &CancellationToken::new(),
    );
    browser.settled().await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    browser.type_search("m");
    tokio::time::sleep(Duration::from_millis(100)).await;
    browser.type_search("");
    tokio::time::sleep(Duration::from_secs(1)).await;
    let state = browser.settled().await.unwrap();

    let queries = source.queries.lock().unwrap().clone();
    assert!(queries.len() <= 2);
    assert!(queries.iter().all(|q| q.search.is_none()));
    assert_eq!(state.view.search(), "");
}

#[tokio::test(start_paused = true)]
async fn burst_of_keystrokes_searches_the_last_value() {
    let source = Arc::new(Counting::default());
    let browser = CatalogBrowser::open(
        source.clone(),
        "municipios",
        CatalogView::new(20),
        Duration::from_millis(300),
        &CancellationToken::new(),
    );
    browser.settled().await.unwrap();
    browser.set_page(2);
    browser.settled().await.unwrap();

    for text in ["a", "ag", "agu", "agua"] {
        browser.type_search(text);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
    let state = browser.settled().await.unwrap();

    let queries = source.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 3);
    let last = queries.last().unwrap();
    assert_eq!(last.search.as_deref(), Some("agua"));
    // a new search returns to the first page
    assert_eq!(last.page, 0);
    assert_eq!(state.view.page(), 1);
}

// ---------------------------------------------------------------------------
// Against the HTTP service
// ---------------------------------------------------------------------------

type SeenQueries = Arc<Mutex<Vec<HashMap<String, String>>>>;

fn catalog_backend(seen: SeenQueries) -> Router {
    Router::new()
        .route(
            "/admin/catalogs/{id}/data",
            get(
                |State(seen): State<SeenQueries>,
                 Path(id): Path<String>,
                 Query(q): Query<HashMap<String, String>>| async move {
                    if id != "municipios" {
                        return (
                            StatusCode::NOT_FOUND,
                            Json(serde_json::json!({"detail": "Catalog not found"})),
                        );
                    }
                    seen.lock().unwrap().push(q.clone());
                    let page: u32 = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
                    (
                        StatusCode::OK,
                        Json(serde_json::json!({
                            "data": [{"code": "05001", "name": "Medellín", "region": "sur"}],
                            "total": 41,
                            "page": page,
                            "page_size": 20,
                        })),
                    )
                },
            ),
        )
        .with_state(seen)
}

#[tokio::test]
async fn filters_and_sort_reach_the_server() {
    let seen: SeenQueries = Arc::default();
    let client = spawn_backend(catalog_backend(seen.clone())).await;
    let browser = CatalogBrowser::open(
        Arc::new(client.catalogs.clone()),
        "municipios",
        CatalogView::new(20),
        Duration::from_millis(50),
        &CancellationToken::new(),
    );
    within(browser.settled()).await.unwrap();

    browser.set_filter("region", "sur");
    browser.toggle_sort("name");
    browser.toggle_sort("name");
    within(browser.settled()).await.unwrap();
    browser.set_page(3);
    let state = within(browser.settled()).await.unwrap();

    let last = seen.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last.get("page").map(String::as_str), Some("2"));
    assert_eq!(last.get("sort_by").map(String::as_str), Some("name"));
    assert_eq!(last.get("sort_order").map(String::as_str), Some("desc"));
    assert_eq!(last.get("filters").map(String::as_str), Some(r#"{"region":"sur"}"#));

    let page = state.page.clone().unwrap();
    assert_eq!(page.rows[0]["name"], "Medellín");
    assert_eq!(state.total_pages(), 3);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn failed_fetch_shows_the_server_detail() {
    let seen: SeenQueries = Arc::default();
    let client = spawn_backend(catalog_backend(seen)).await;
    let browser = CatalogBrowser::open(
        Arc::new(client.catalogs.clone()),
        "missing",
        CatalogView::default(),
        Duration::from_millis(50),
        &CancellationToken::new(),
    );
    let state = within(browser.settled()).await.unwrap();
    assert_eq!(state.error.as_deref(), Some("Catalog not found"));
    assert!(state.page.is_none());
}
