//! Context validation: the operator reviews values gathered by earlier steps
//! and approves or rejects them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::input::payload::SubmitPayload;
use crate::input::InputComponent;

pub const DECISION_APPROVED: &str = "approved";
pub const DECISION_REJECTED: &str = "rejected";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationItem {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// `input_form` payload for context validation steps.
///
/// Older engines send a bare `context` map instead of `items`; both decode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContextValidationConfig {
    #[serde(default)]
    pub step_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<ValidationItem>,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl ContextValidationConfig {
    /// Items to display, in declared order, falling back to the context map.
    pub fn display_items(&self) -> Vec<ValidationItem> {
        if !self.items.is_empty() {
            return self.items.clone();
        }
        self.context
            .iter()
            .map(|(key, value)| ValidationItem {
                key: key.clone(),
                label: None,
                value: value.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone)]
pub struct ContextValidationInput {
    step_id: String,
    config: ContextValidationConfig,
    decision: Option<ValidationDecision>,
    comments: String,
    confirmed: BTreeSet<String>,
}

impl ContextValidationInput {
    pub fn new(step_id: impl Into<String>, config: ContextValidationConfig) -> Self {
        Self {
            step_id: step_id.into(),
            config,
            decision: None,
            comments: String::new(),
            confirmed: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &ContextValidationConfig {
        &self.config
    }

    /// Tick one displayed item as checked by the operator.
    pub fn confirm(&mut self, key: &str) -> Result<(), CoreError> {
        if !self.config.display_items().iter().any(|i| i.key == key) {
            return Err(CoreError::Validation(format!("Unknown item '{key}'")));
        }
        self.confirmed.insert(key.to_string());
        Ok(())
    }

    pub fn approve(&mut self, comments: impl Into<String>) {
        self.decision = Some(ValidationDecision::Approve);
        self.comments = comments.into();
    }

    pub fn reject(&mut self, comments: impl Into<String>) {
        self.decision = Some(ValidationDecision::Reject);
        self.comments = comments.into();
    }

    pub fn decision(&self) -> Option<ValidationDecision> {
        self.decision
    }
}

impl InputComponent for ContextValidationInput {
    fn step_id(&self) -> &str {
        &self.step_id
    }

    fn validate(&self) -> Result<(), CoreError> {
        match self.decision {
            None => Err(CoreError::Validation(
                "Approve or reject the information before submitting".to_string(),
            )),
            Some(ValidationDecision::Reject) if self.comments.trim().is_empty() => Err(
                CoreError::Validation("A rejection requires comments".to_string()),
            ),
            Some(_) => Ok(()),
        }
    }

    fn to_payload(&self) -> Result<SubmitPayload, CoreError> {
        self.validate()?;
        let decision = match self.decision {
            Some(ValidationDecision::Reject) => DECISION_REJECTED,
            _ => DECISION_APPROVED,
        };
        Ok(SubmitPayload::Json(serde_json::json!({
            "validation_decision": decision,
            "validation_comments": self.comments.trim(),
            "validated_fields": self.confirmed.iter().collect::<Vec<_>>(),
        })))
    }
}
