use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

/// Binding of an instance to a user or a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub instance_id: EntityId,
    #[serde(default)]
    pub assigned_user_id: Option<EntityId>,
    #[serde(default)]
    pub assigned_team_id: Option<EntityId>,
    pub assignment_status: String,
    #[serde(default)]
    pub assigned_at: Option<Timestamp>,
    #[serde(default)]
    pub assigned_by: Option<EntityId>,
    #[serde(default)]
    pub assignment_notes: Option<String>,
}

/// Who an instance is assigned to. A request can name exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssignmentTarget {
    User(EntityId),
    Team(EntityId),
}

impl Assignment {
    /// The active target. A user assignment wins if the server reports both.
    pub fn target(&self) -> Option<AssignmentTarget> {
        if let Some(user) = &self.assigned_user_id {
            if self.assigned_team_id.is_some() {
                tracing::warn!(
                    instance_id = %self.instance_id,
                    "Assignment carries both user and team; using the user",
                );
            }
            return Some(AssignmentTarget::User(user.clone()));
        }
        self.assigned_team_id.clone().map(AssignmentTarget::Team)
    }
}

/// Body for the assign-to-user / assign-to-team endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignRequest {
    pub instance_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_team_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_notes: Option<String>,
}

impl AssignRequest {
    pub fn new(
        instance_id: impl Into<EntityId>,
        target: AssignmentTarget,
        notes: Option<String>,
    ) -> Result<Self, CoreError> {
        let instance_id = instance_id.into();
        if instance_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "instance_id must not be empty".to_string(),
            ));
        }
        let (assigned_user_id, assigned_team_id) = match target {
            AssignmentTarget::User(id) => (Some(id), None),
            AssignmentTarget::Team(id) => (None, Some(id)),
        };
        Ok(Self {
            instance_id,
            assigned_user_id,
            assigned_team_id,
            assignment_notes: notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Query-string filters for the assignment list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}
