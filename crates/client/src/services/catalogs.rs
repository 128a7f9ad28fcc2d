use civica_core::models::{Catalog, CatalogDataPage, CatalogDataQuery, CatalogDraft, SyncResult};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpClient;

/// Outcome of `POST /admin/catalogs/test-connection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTest {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

/// Admin catalog management and catalog data queries.
#[derive(Debug, Clone)]
pub struct CatalogsService {
    http: HttpClient,
}

impl CatalogsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<Catalog>, ApiError> {
        self.http.get("list catalogs", "/admin/catalogs").await
    }

    pub async fn get(&self, id: &str) -> Result<Catalog, ApiError> {
        self.http
            .get("load catalog", &format!("/admin/catalogs/{id}"))
            .await
    }

    pub async fn create(&self, draft: &CatalogDraft) -> Result<Catalog, ApiError> {
        draft.validate()?;
        self.http
            .post("create catalog", "/admin/catalogs", draft)
            .await
    }

    pub async fn update(&self, id: &str, draft: &CatalogDraft) -> Result<Catalog, ApiError> {
        draft.validate()?;
        self.http
            .put("update catalog", &format!("/admin/catalogs/{id}"), draft)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.http
            .delete("delete catalog", &format!("/admin/catalogs/{id}"))
            .await
    }

    /// Pull fresh data from the catalog's source.
    pub async fn sync(&self, id: &str) -> Result<SyncResult, ApiError> {
        self.http
            .post_empty("sync catalog", &format!("/admin/catalogs/{id}/sync"))
            .await
    }

    pub async fn test_connection(&self, draft: &CatalogDraft) -> Result<ConnectionTest, ApiError> {
        self.http
            .post("test catalog connection", "/admin/catalogs/test-connection", draft)
            .await
    }

    /// First rows of a not-yet-saved catalog definition.
    pub async fn preview_data(&self, draft: &CatalogDraft) -> Result<CatalogDataPage, ApiError> {
        self.http
            .post("preview catalog data", "/admin/catalogs/preview-data", draft)
            .await
    }

    /// One page of catalog rows. `query.page` is 0-based.
    pub async fn data(
        &self,
        id: &str,
        query: &CatalogDataQuery,
    ) -> Result<CatalogDataPage, ApiError> {
        self.http
            .get_query(
                "load catalog data",
                &format!("/admin/catalogs/{id}/data"),
                &query.to_query_pairs(),
            )
            .await
    }
}
