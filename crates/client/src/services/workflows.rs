use civica_core::models::{WorkflowDefinition, WorkflowDraft, WorkflowInstance};
use civica_core::EntityId;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::HttpClient;

/// Filters for `GET /workflows`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct WorkflowListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Workflow definitions.
#[derive(Debug, Clone)]
pub struct WorkflowsService {
    http: HttpClient,
}

impl WorkflowsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(
        &self,
        params: &WorkflowListParams,
    ) -> Result<Vec<WorkflowDefinition>, ApiError> {
        self.http
            .get_query("list workflows", "/workflows", params)
            .await
    }

    pub async fn get(&self, id: &str) -> Result<WorkflowDefinition, ApiError> {
        self.http
            .get("load workflow", &format!("/workflows/{id}"))
            .await
    }

    pub async fn create(&self, draft: &WorkflowDraft) -> Result<WorkflowDefinition, ApiError> {
        draft.validate()?;
        self.http
            .post("create workflow", "/workflows", draft)
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        draft: &WorkflowDraft,
    ) -> Result<WorkflowDefinition, ApiError> {
        draft.validate()?;
        self.http
            .put("update workflow", &format!("/workflows/{id}"), draft)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.http
            .delete("delete workflow", &format!("/workflows/{id}"))
            .await
    }

    /// Create a new instance of a workflow with an initial context.
    pub async fn instantiate(
        &self,
        id: &str,
        context: &serde_json::Value,
    ) -> Result<WorkflowInstance, ApiError> {
        let body = serde_json::json!({ "context": context });
        self.http
            .post(
                "create instance",
                &format!("/workflows/{id}/instances"),
                &body,
            )
            .await
    }
}
