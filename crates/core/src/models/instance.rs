use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Timestamp};

/// A citizen-submitted run of a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    #[serde(alias = "id")]
    pub instance_id: EntityId,
    pub workflow_id: EntityId,
    #[serde(default)]
    pub workflow_name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub current_step: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    /// Opaque bag of step outputs and citizen data.
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default)]
    pub assigned_user_id: Option<EntityId>,
    #[serde(default)]
    pub assigned_team_id: Option<EntityId>,
    #[serde(default)]
    pub assignment_status: Option<String>,
}

impl WorkflowInstance {
    /// Neither a user nor a team owns the instance.
    pub fn is_unassigned(&self) -> bool {
        self.assigned_user_id.is_none() && self.assigned_team_id.is_none()
    }
}

/// Query-string filters for `GET /instances`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}
