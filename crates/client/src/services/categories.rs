use civica_core::models::{Category, CategoryDraft};

use crate::error::ApiError;
use crate::http::HttpClient;

#[derive(Debug, Clone)]
pub struct CategoriesService {
    http: HttpClient,
}

impl CategoriesService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        self.http.get("list categories", "/categories").await
    }

    pub async fn get(&self, id: &str) -> Result<Category, ApiError> {
        self.http
            .get("load category", &format!("/categories/{id}"))
            .await
    }

    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category, ApiError> {
        draft.validate()?;
        self.http
            .post("create category", "/categories", draft)
            .await
    }

    pub async fn update(&self, id: &str, draft: &CategoryDraft) -> Result<Category, ApiError> {
        draft.validate()?;
        self.http
            .put("update category", &format!("/categories/{id}"), draft)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.http
            .delete("delete category", &format!("/categories/{id}"))
            .await
    }
}
