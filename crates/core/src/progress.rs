//! Admin progress projection of a workflow instance.
//!
//! Returned by `GET /instances/{id}/track`. Richer than the plain instance:
//! it carries step counts, the `waiting_for` discriminator and the
//! polymorphic `input_form` payload for paused steps.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status;
use crate::types::{EntityId, Timestamp};
use crate::waiting_for::WaitingFor;

/// Admin view of an instance's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminWorkflowProgress {
    pub instance_id: EntityId,
    #[serde(default)]
    pub workflow_id: Option<EntityId>,
    #[serde(default)]
    pub workflow_name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub current_step_name: Option<String>,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub completed_steps: u32,
    #[serde(default)]
    pub requires_input: bool,
    #[serde(default)]
    pub waiting_for: Option<WaitingFor>,
    /// Shape depends on `waiting_for`; decoded by [`crate::input::InputRequest`].
    #[serde(default)]
    pub input_form: Option<serde_json::Value>,
    #[serde(default)]
    pub steps: Vec<StepSummary>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// One step of the workflow definition as seen by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Visual state of one stepper entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Current,
    Pending,
}

/// One entry of the rendered step-progress stepper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepperEntry {
    pub index: u32,
    pub label: String,
    pub state: StepState,
}

impl AdminWorkflowProgress {
    /// Check the projection invariants before rendering it.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.progress_percentage.is_finite()
            || !(0.0..=100.0).contains(&self.progress_percentage)
        {
            return Err(CoreError::Validation(format!(
                "progress_percentage must lie in [0, 100], got {}",
                self.progress_percentage
            )));
        }
        if self.completed_steps > self.total_steps {
            return Err(CoreError::Validation(format!(
                "completed_steps ({}) exceeds total_steps ({})",
                self.completed_steps, self.total_steps
            )));
        }
        Ok(())
    }

    /// Whether the instance is stopped on a step that needs input.
    pub fn is_paused(&self) -> bool {
        self.status == status::STATUS_PAUSED
    }

    /// Build the step-progress stepper: exactly `total_steps` entries.
    ///
    /// Labels come from `steps` when the server sent them, otherwise a
    /// positional "Step N" label is used.
    pub fn stepper(&self) -> Vec<StepperEntry> {
        let finished = status::is_terminal(&self.status);
        (0..self.total_steps)
            .map(|index| {
                let label = self
                    .steps
                    .get(index as usize)
                    .and_then(|s| s.name.clone().or_else(|| Some(s.step_id.clone())))
                    .unwrap_or_else(|| format!("Step {}", index + 1));
                let state = if index < self.completed_steps {
                    StepState::Completed
                } else if index == self.completed_steps && !finished {
                    StepState::Current
                } else {
                    StepState::Pending
                };
                StepperEntry {
                    index,
                    label,
                    state,
                }
            })
            .collect()
    }
}
