use civica_core::input::SubmitPayload;
use civica_core::models::{InstanceListParams, Page, WorkflowInstance};
use civica_core::progress::AdminWorkflowProgress;

use crate::error::ApiError;
use crate::http::HttpClient;

/// Workflow instances and their lifecycle actions.
#[derive(Debug, Clone)]
pub struct InstancesService {
    http: HttpClient,
}

impl InstancesService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(
        &self,
        params: &InstanceListParams,
    ) -> Result<Page<WorkflowInstance>, ApiError> {
        self.http
            .get_query("list instances", "/instances", params)
            .await
    }

    pub async fn get(&self, id: &str) -> Result<WorkflowInstance, ApiError> {
        self.http
            .get("load instance", &format!("/instances/{id}"))
            .await
    }

    /// Admin progress projection, including any pending input request.
    pub async fn track(&self, id: &str) -> Result<AdminWorkflowProgress, ApiError> {
        let progress: AdminWorkflowProgress = self
            .http
            .get("track instance", &format!("/instances/{id}/track"))
            .await?;
        if let Err(e) = progress.validate() {
            tracing::warn!(instance_id = %id, error = %e, "Progress projection out of range");
        }
        Ok(progress)
    }

    pub async fn start(&self, id: &str) -> Result<serde_json::Value, ApiError> {
        self.http
            .post_empty("start instance", &format!("/instances/{id}/start"))
            .await
    }

    /// Submit the collected input of a paused step.
    pub async fn submit_data(
        &self,
        id: &str,
        payload: &SubmitPayload,
    ) -> Result<serde_json::Value, ApiError> {
        self.http
            .post_payload(
                "submit data",
                &format!("/instances/{id}/submit-data"),
                payload,
            )
            .await
    }

    pub async fn unassign(&self, id: &str) -> Result<serde_json::Value, ApiError> {
        self.http
            .post_empty("unassign instance", &format!("/instances/{id}/unassign"))
            .await
    }

    pub async fn cancel(&self, id: &str, reason: Option<&str>) -> Result<serde_json::Value, ApiError> {
        let body = serde_json::json!({ "reason": reason });
        self.http
            .post("cancel instance", &format!("/instances/{id}/cancel"), &body)
            .await
    }
}
