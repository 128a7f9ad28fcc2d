use civica_core::models::{Page, WorkflowInstance};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpClient;

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_instances: u64,
    #[serde(default)]
    pub pending_assignment: u64,
    #[serde(default)]
    pub in_progress: u64,
    #[serde(default)]
    pub requires_action: u64,
    #[serde(default)]
    pub completed: u64,
    /// Counters this client does not know about yet.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct AdminService {
    http: HttpClient,
}

impl AdminService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Instances waiting on an administrator.
    pub async fn inbox(&self, page: u32, page_size: u32) -> Result<Page<WorkflowInstance>, ApiError> {
        self.http
            .get_query(
                "load admin inbox",
                "/admin/inbox",
                &[("page", page), ("page_size", page_size)],
            )
            .await
    }

    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.http.get("load dashboard stats", "/admin/stats").await
    }
}
