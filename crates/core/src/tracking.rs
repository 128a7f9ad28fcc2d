//! Interpretation of a tracked instance's progress into the stage the
//! console should render.

use crate::error::CoreError;
use crate::input::InputRequest;
use crate::progress::AdminWorkflowProgress;
use crate::status;

/// End state of a finished instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Completed,
    Failed,
    Cancelled,
}

impl Terminal {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            status::STATUS_COMPLETED => Some(Self::Completed),
            status::STATUS_FAILED => Some(Self::Failed),
            status::STATUS_CANCELLED => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// What the tracking screen shows for an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingStage {
    /// Not started yet; the start action is offered.
    AwaitingStart,
    /// The engine is executing steps.
    Running,
    /// Paused on a step that needs operator input.
    AwaitingInput(InputRequest),
    Finished(Terminal),
    /// Any status the console has no dedicated view for.
    Other(String),
}

impl TrackingStage {
    pub fn from_progress(progress: &AdminWorkflowProgress) -> Result<Self, CoreError> {
        if let Some(request) = InputRequest::from_progress(progress)? {
            return Ok(Self::AwaitingInput(request));
        }
        let current = progress.status.as_str();
        if let Some(terminal) = Terminal::parse(current) {
            return Ok(Self::Finished(terminal));
        }
        if status::is_running(current) {
            return Ok(Self::Running);
        }
        if status::is_startable(current, None) {
            return Ok(Self::AwaitingStart);
        }
        Ok(Self::Other(current.to_string()))
    }

    pub fn offers_start(&self) -> bool {
        matches!(self, Self::AwaitingStart)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}
