//! Input-collection components for paused workflow steps.
//!
//! A paused instance reports `waiting_for` plus an `input_form` payload.
//! [`InputRequest::from_progress`] decodes the pair into a typed request and
//! [`InputCollector`] holds the local state of exactly one component for it.
//! Every component validates locally and produces a [`SubmitPayload`] for the
//! single `submit-data` endpoint.

pub mod context_validation;
pub mod form;
pub mod payload;
pub mod selection;
pub mod signature;

use serde::de::DeserializeOwned;

use crate::error::CoreError;
use crate::progress::AdminWorkflowProgress;
use crate::waiting_for::{InputKind, WaitingFor};

pub use context_validation::{ContextValidationConfig, ContextValidationInput};
pub use form::{FieldSpec, FieldType, FormConfig, FormInput};
pub use payload::{FilePart, SubmitPayload};
pub use selection::{SelectionConfig, SelectionInput, SelectionKind, SelectionMode};
pub use signature::{SignatureConfig, SignatureInput};

/// Step id used when neither the form nor the progress names one.
pub const DEFAULT_STEP_ID: &str = "step";

/// Contract shared by every input component.
pub trait InputComponent {
    /// Step the input belongs to; used to key selection payloads.
    fn step_id(&self) -> &str;

    /// Client-side checks. Failures are never sent to the server.
    fn validate(&self) -> Result<(), CoreError>;

    /// Validate, then build the submit-data body.
    fn to_payload(&self) -> Result<SubmitPayload, CoreError>;
}

/// A decoded request for input, one variant per component.
#[derive(Debug, Clone, PartialEq)]
pub enum InputRequest {
    Form {
        step_id: String,
        config: FormConfig,
        /// Mounted because `waiting_for` was not recognized.
        fallback: Option<String>,
    },
    Signature {
        step_id: String,
        config: SignatureConfig,
    },
    ContextValidation {
        step_id: String,
        config: ContextValidationConfig,
    },
    CatalogSelection {
        step_id: String,
        config: SelectionConfig,
    },
    EntitySelection {
        step_id: String,
        config: SelectionConfig,
    },
}

impl InputRequest {
    /// Decode the input request of a paused instance.
    ///
    /// Returns `Ok(None)` when the instance is not paused. A paused instance
    /// without `waiting_for` is treated as `user_input`.
    pub fn from_progress(progress: &AdminWorkflowProgress) -> Result<Option<Self>, CoreError> {
        if !progress.is_paused() {
            return Ok(None);
        }
        let waiting_for = progress
            .waiting_for
            .clone()
            .unwrap_or(WaitingFor::UserInput);
        let raw = progress
            .input_form
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        let step_id = raw
            .get("step_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| progress.current_step.clone())
            .unwrap_or_else(|| DEFAULT_STEP_ID.to_string());

        let request = match waiting_for.input_kind() {
            InputKind::Form => {
                let fallback = match &waiting_for {
                    WaitingFor::Unknown(raw_kind) => {
                        tracing::warn!(
                            instance_id = %progress.instance_id,
                            waiting_for = %raw_kind,
                            "Unrecognized waiting_for; falling back to the generic form",
                        );
                        Some(raw_kind.clone())
                    }
                    _ => None,
                };
                Self::Form {
                    step_id,
                    config: decode(&raw, "form")?,
                    fallback,
                }
            }
            InputKind::Signature => Self::Signature {
                step_id,
                config: decode(&raw, "signature")?,
            },
            InputKind::ContextValidation => Self::ContextValidation {
                step_id,
                config: decode(&raw, "context validation")?,
            },
            InputKind::CatalogSelection => Self::CatalogSelection {
                step_id,
                config: decode(&raw, "catalog selection")?,
            },
            InputKind::EntitySelection => Self::EntitySelection {
                step_id,
                config: decode(&raw, "entity selection")?,
            },
        };
        Ok(Some(request))
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Form { .. } => InputKind::Form,
            Self::Signature { .. } => InputKind::Signature,
            Self::ContextValidation { .. } => InputKind::ContextValidation,
            Self::CatalogSelection { .. } => InputKind::CatalogSelection,
            Self::EntitySelection { .. } => InputKind::EntitySelection,
        }
    }

    pub fn step_id(&self) -> &str {
        match self {
            Self::Form { step_id, .. }
            | Self::Signature { step_id, .. }
            | Self::ContextValidation { step_id, .. }
            | Self::CatalogSelection { step_id, .. }
            | Self::EntitySelection { step_id, .. } => step_id,
        }
    }
}

fn decode<T: DeserializeOwned>(raw: &serde_json::Value, what: &str) -> Result<T, CoreError> {
    serde_json::from_value(raw.clone())
        .map_err(|e| CoreError::Validation(format!("Malformed {what} input_form: {e}")))
}

/// The one mounted input component for a paused step.
#[derive(Debug, Clone)]
pub enum InputCollector {
    Form(FormInput),
    Signature(SignatureInput),
    ContextValidation(ContextValidationInput),
    Selection(SelectionInput),
}

impl InputCollector {
    /// Mount the component matching a request.
    pub fn mount(request: InputRequest) -> Self {
        match request {
            InputRequest::Form {
                step_id,
                config,
                fallback,
            } => match fallback {
                Some(_) => Self::Form(FormInput::fallback(step_id, config)),
                None => Self::Form(FormInput::new(step_id, config)),
            },
            InputRequest::Signature { step_id, config } => {
                Self::Signature(SignatureInput::new(step_id, config))
            }
            InputRequest::ContextValidation { step_id, config } => {
                Self::ContextValidation(ContextValidationInput::new(step_id, config))
            }
            InputRequest::CatalogSelection { step_id, config } => Self::Selection(
                SelectionInput::new(step_id, SelectionKind::Catalog, config),
            ),
            InputRequest::EntitySelection { step_id, config } => Self::Selection(
                SelectionInput::new(step_id, SelectionKind::Entity, config),
            ),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Form(_) => InputKind::Form,
            Self::Signature(_) => InputKind::Signature,
            Self::ContextValidation(_) => InputKind::ContextValidation,
            Self::Selection(s) => match s.kind() {
                SelectionKind::Catalog => InputKind::CatalogSelection,
                SelectionKind::Entity => InputKind::EntitySelection,
            },
        }
    }

    fn component(&self) -> &dyn InputComponent {
        match self {
            Self::Form(c) => c,
            Self::Signature(c) => c,
            Self::ContextValidation(c) => c,
            Self::Selection(c) => c,
        }
    }
}

impl InputComponent for InputCollector {
    fn step_id(&self) -> &str {
        self.component().step_id()
    }

    fn validate(&self) -> Result<(), CoreError> {
        self.component().validate()
    }

    fn to_payload(&self) -> Result<SubmitPayload, CoreError> {
        self.component().to_payload()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn paused(waiting_for: &str, input_form: serde_json::Value) -> AdminWorkflowProgress {
        serde_json::from_value(serde_json::json!({
            "instance_id": "X",
            "status": "paused",
            "current_step": "s2",
            "waiting_for": waiting_for,
            "input_form": input_form,
            "total_steps": 3,
            "completed_steps": 1,
            "progress_percentage": 33.0,
        }))
        .unwrap()
    }

    #[test]
    fn not_paused_has_no_request() {
        let mut p = paused("signature", serde_json::json!({}));
        p.status = "running".into();
        assert_eq!(InputRequest::from_progress(&p).unwrap(), None);
    }

    #[test]
    fn signature_mounts_signature_component() {
        let p = paused("signature", serde_json::json!({"step_id": "firma"}));
        let request = InputRequest::from_progress(&p).unwrap().unwrap();
        assert_eq!(request.step_id(), "firma");
        let collector = InputCollector::mount(request);
        assert_matches!(collector, InputCollector::Signature(_));
        assert_eq!(collector.kind(), InputKind::Signature);
    }

    #[test]
    fn selection_kinds_mount_selector() {
        let form = serde_json::json!({"catalog_id": "c1", "selection_mode": "multiple"});
        for (raw, kind) in [
            ("catalog_selection", InputKind::CatalogSelection),
            ("entity_selection", InputKind::EntitySelection),
        ] {
            let p = paused(raw, form.clone());
            let request = InputRequest::from_progress(&p).unwrap().unwrap();
            // step id falls back to current_step
            assert_eq!(request.step_id(), "s2");
            let collector = InputCollector::mount(request);
            assert_matches!(collector, InputCollector::Selection(_));
            assert_eq!(collector.kind(), kind);
        }
    }

    #[test]
    fn context_validation_mounts_validation_display() {
        let p = paused("context_validation", serde_json::json!({"context": {"a": 1}}));
        let collector = InputCollector::mount(InputRequest::from_progress(&p).unwrap().unwrap());
        assert_matches!(collector, InputCollector::ContextValidation(_));
    }

    #[test]
    fn unknown_kind_falls_back_to_form() {
        let p = paused("face_match", serde_json::json!({"fields": []}));
        let request = InputRequest::from_progress(&p).unwrap().unwrap();
        assert_matches!(
            &request,
            InputRequest::Form { fallback: Some(kind), .. } if kind == "face_match"
        );
        match InputCollector::mount(request) {
            InputCollector::Form(form) => assert!(form.is_fallback()),
            other => panic!("expected form, got {other:?}"),
        }
    }

    #[test]
    fn malformed_selection_config_is_reported() {
        let p = paused("catalog_selection", serde_json::json!({"selection_mode": "multiple"}));
        let err = InputRequest::from_progress(&p).unwrap_err();
        assert!(err.to_string().contains("catalog selection"));
    }
}
