use civica_core::models::{
    AssignRequest, Assignment, AssignmentListParams, AssignmentTarget, Page, WorkflowInstance,
};

use crate::error::ApiError;
use crate::http::HttpClient;

/// Instance assignments to users and teams.
#[derive(Debug, Clone)]
pub struct AssignmentsService {
    http: HttpClient,
}

impl AssignmentsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(
        &self,
        params: &AssignmentListParams,
    ) -> Result<Page<WorkflowInstance>, ApiError> {
        self.http
            .get_query("list assignments", "/assignments", params)
            .await
    }

    /// Instances assigned to the current user, directly or via a team.
    pub async fn mine(
        &self,
        params: &AssignmentListParams,
    ) -> Result<Page<WorkflowInstance>, ApiError> {
        self.http
            .get_query(
                "list my assignments",
                "/assignments/my-assignments",
                params,
            )
            .await
    }

    /// Instances nobody has picked up yet.
    pub async fn pending(
        &self,
        params: &AssignmentListParams,
    ) -> Result<Page<WorkflowInstance>, ApiError> {
        self.http
            .get_query("list pending assignments", "/assignments/pending", params)
            .await
    }

    pub async fn assign(&self, request: &AssignRequest) -> Result<Assignment, ApiError> {
        match (&request.assigned_user_id, &request.assigned_team_id) {
            (Some(_), None) => {
                self.http
                    .post("assign instance", "/assignments/assign-user", request)
                    .await
            }
            (None, Some(_)) => {
                self.http
                    .post("assign instance", "/assignments/assign-team", request)
                    .await
            }
            _ => Err(civica_core::CoreError::Validation(
                "An assignment must name exactly one user or team".to_string(),
            )
            .into()),
        }
    }

    pub async fn assign_user(
        &self,
        instance_id: &str,
        user_id: &str,
        notes: Option<String>,
    ) -> Result<Assignment, ApiError> {
        let request = AssignRequest::new(
            instance_id,
            AssignmentTarget::User(user_id.to_string()),
            notes,
        )?;
        self.assign(&request).await
    }

    pub async fn assign_team(
        &self,
        instance_id: &str,
        team_id: &str,
        notes: Option<String>,
    ) -> Result<Assignment, ApiError> {
        let request = AssignRequest::new(
            instance_id,
            AssignmentTarget::Team(team_id.to_string()),
            notes,
        )?;
        self.assign(&request).await
    }

    /// Start an instance already assigned to the current user.
    pub async fn start(&self, instance_id: &str) -> Result<serde_json::Value, ApiError> {
        self.http
            .post_empty(
                "start assignment",
                &format!("/assignments/{instance_id}/start"),
            )
            .await
    }

    /// Assign an unowned instance to the current user and start it.
    pub async fn quick_start(&self, instance_id: &str) -> Result<serde_json::Value, ApiError> {
        self.http
            .post_empty(
                "quick-start instance",
                &format!("/assignments/{instance_id}/quick-start"),
            )
            .await
    }
}
