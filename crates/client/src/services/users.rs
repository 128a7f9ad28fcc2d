use civica_core::models::{User, UserDraft};

use crate::error::ApiError;
use crate::http::HttpClient;

#[derive(Debug, Clone)]
pub struct UsersService {
    http: HttpClient,
}

impl UsersService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.http.get("list users", "/auth/users").await
    }

    pub async fn get(&self, id: &str) -> Result<User, ApiError> {
        self.http
            .get("load user", &format!("/auth/users/{id}"))
            .await
    }

    pub async fn create(&self, draft: &UserDraft) -> Result<User, ApiError> {
        draft.validate()?;
        self.http.post("create user", "/auth/users", draft).await
    }

    pub async fn update(&self, id: &str, draft: &UserDraft) -> Result<User, ApiError> {
        draft.validate()?;
        self.http
            .put("update user", &format!("/auth/users/{id}"), draft)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.http
            .delete("delete user", &format!("/auth/users/{id}"))
            .await
    }

    /// The operator the current token belongs to.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.http.get("load current user", "/auth/me").await
    }
}
