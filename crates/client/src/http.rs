//! Shared HTTP adapter for every domain service.
//!
//! Wraps one [`reqwest::Client`] with the API base URL and the bearer-token
//! capability. One attempt per call; retries belong to the query cache.

use std::sync::Arc;
use std::time::Duration;

use civica_core::input::{FilePart, SubmitPayload};
use civica_core::CoreError;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::TokenProvider;
use crate::config::{join_url, ClientConfig};
use crate::error::ApiError;

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    token: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Build a client from configuration.
    pub fn new(config: &ClientConfig, token: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|source| ApiError::Transport {
            operation: "build HTTP client",
            source,
        })?;
        Ok(Self::with_client(client, config.base_url(), token))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    // ---- verbs ----

    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path);
        self.execute(operation, request).await
    }

    pub async fn get_query<T, Q>(
        &self,
        operation: &'static str,
        path: &str,
        query: &Q,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path).query(query);
        self.execute(operation, request).await
    }

    pub async fn post<T, B>(&self, operation: &'static str, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path).json(body);
        self.execute(operation, request).await
    }

    /// POST without a body.
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path);
        self.execute(operation, request).await
    }

    pub async fn put<T, B>(&self, operation: &'static str, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::PUT, path).json(body);
        self.execute(operation, request).await
    }

    pub async fn delete(&self, operation: &'static str, path: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, path);
        let response = self.send(operation, request).await?;
        Self::ensure_success(operation, response).await?;
        Ok(())
    }

    /// POST a submit-data payload as JSON or multipart.
    pub async fn post_payload<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        payload: &SubmitPayload,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path);
        let request = match payload {
            SubmitPayload::Json(body) => request.json(body),
            SubmitPayload::Multipart { fields, files } => {
                request.multipart(multipart_form(fields, files)?)
            }
        };
        self.execute(operation, request).await
    }

    // ---- private helpers ----

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string());
        if let Some(token) = self.token.bearer_token() {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(operation, "Sending API request");
        request.send().await.map_err(|source| {
            tracing::warn!(operation, error = %source, "API request failed");
            ApiError::Transport { operation, source }
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(operation, request).await?;
        Self::parse_response(operation, response).await
    }

    /// Return the response unchanged on success, or an [`ApiError::Api`]
    /// carrying the normalized detail message.
    async fn ensure_success(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_response(operation, status.as_u16(), &body);
            tracing::warn!(operation, status = status.as_u16(), error = %err, "API request rejected");
            return Err(err);
        }
        Ok(response)
    }

    /// Decode a successful body. An empty body decodes as JSON `null`.
    async fn parse_response<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(operation, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|source| ApiError::Decode { operation, source })
    }
}

fn multipart_form(
    fields: &[(String, String)],
    files: &[FilePart],
) -> Result<reqwest::multipart::Form, ApiError> {
    let mut form = reqwest::multipart::Form::new();
    for (name, value) in fields {
        form = form.text(name.clone(), value.clone());
    }
    for file in files {
        let mut part =
            reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type).map_err(|_| {
                CoreError::Validation(format!(
                    "Invalid content type '{content_type}' for {}",
                    file.filename
                ))
            })?;
        }
        form = form.part(file.field.clone(), part);
    }
    Ok(form)
}
