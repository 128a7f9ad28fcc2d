use crate::types::EntityId;

/// Domain-level error shared by every crate in the workspace.
///
/// Local validation failures (required fields, selection bounds, progress
/// invariants) are reported as [`CoreError::Validation`] and never reach the
/// network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The bare message without the variant prefix, suitable for an inline
    /// banner next to the control that failed.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound { entity, id } => format!("{entity} with id {id} not found"),
            Self::Validation(msg)
            | Self::Conflict(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Internal(msg) => msg.clone(),
        }
    }
}
