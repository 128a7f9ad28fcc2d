use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

/// A workflow definition as listed in the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(alias = "workflow_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<EntityId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub step_id: String,
    pub name: String,
    /// Engine step type, e.g. `form`, `signature`, `approval`.
    #[serde(default)]
    pub step_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
    pub is_active: bool,
    pub steps: Vec<StepDefinition>,
}

impl WorkflowDraft {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Workflow name must not be empty".to_string(),
            ));
        }
        let mut ids = std::collections::HashSet::new();
        for step in &self.steps {
            if !ids.insert(step.step_id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate step_id '{}'",
                    step.step_id
                )));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
