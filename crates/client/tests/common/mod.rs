#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use axum::Router;

use civica_client::{ApiClient, ClientConfig, HttpClient, StaticToken, TokenProvider};

/// A request as seen by the stub backend.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

impl Seen {
    pub fn from_parts(uri: &axum::http::Uri, headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            authorization: header("authorization"),
            request_id: header("x-request-id"),
        }
    }
}

/// Shared log of requests received by a stub.
pub type SeenLog = Arc<Mutex<Vec<Seen>>>;

pub fn seen_log() -> SeenLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Serve `api` under `/api/v1` on an ephemeral local port.
///
/// Returns the matching client configuration.
pub async fn spawn_backend(api: Router) -> ClientConfig {
    let app = Router::new().nest("/api/v1", api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ClientConfig {
        api_url: format!("http://{addr}/"),
        api_base_url: "/api/v1".to_string(),
        api_token: None,
        connect_timeout_secs: Some(2),
    }
}

pub fn client_with_token(config: &ClientConfig, token: Option<&str>) -> ApiClient {
    let provider: Arc<dyn TokenProvider> = match token {
        Some(t) => Arc::new(StaticToken::new(t)),
        None => Arc::new(StaticToken::none()),
    };
    ApiClient::with_token(config, provider).unwrap()
}

pub fn http(config: &ClientConfig) -> HttpClient {
    HttpClient::new(config, Arc::new(StaticToken::none())).unwrap()
}

/// An instance record in the shape the backend returns.
pub fn instance_json(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "instance_id": id,
        "workflow_id": "wf-1",
        "workflow_name": "Licencia de obra",
        "status": status,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:05:00Z",
        "context": {},
    })
}
