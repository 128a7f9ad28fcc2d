#![allow(dead_code)]

use std::time::Duration;

use axum::Router;

use civica_client::{ApiClient, ClientConfig};
use civica_query::{QueryCache, QueryConfig};

/// Serve `api` under `/api/v1` on an ephemeral local port.
pub async fn spawn_backend(api: Router) -> ApiClient {
    let app = Router::new().nest("/api/v1", api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let config = ClientConfig {
        api_url: format!("http://{addr}"),
        api_base_url: "/api/v1".to_string(),
        api_token: Some("test-token".to_string()),
        connect_timeout_secs: Some(2),
    };
    ApiClient::from_config(&config).unwrap()
}

/// A cache that surfaces failures at once.
pub fn cache() -> QueryCache {
    QueryCache::new(QueryConfig {
        retry: 0,
        retry_delay: Duration::from_millis(10),
        ..Default::default()
    })
}

/// Bound a wait so a broken test fails instead of hanging.
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

pub fn instance_json(id: &str, status: &str, user: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "instance_id": id,
        "workflow_id": "wf-1",
        "workflow_name": "Licencia de obra",
        "status": status,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:05:00Z",
        "assigned_user_id": user,
    })
}
