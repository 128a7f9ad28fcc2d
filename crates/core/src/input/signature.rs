//! Digital signature input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::input::form::{FieldSpec, FieldType};
use crate::input::payload::SubmitPayload;
use crate::input::InputComponent;

/// `input_form` payload for signature steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureConfig {
    #[serde(default)]
    pub step_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Document the signer is asked to sign, if any.
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default = "default_signer_fields")]
    pub signer_fields: Vec<FieldSpec>,
    #[serde(default = "default_true")]
    pub require_terms: bool,
    #[serde(default)]
    pub terms_text: Option<String>,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            step_id: None,
            title: None,
            document_url: None,
            signer_fields: default_signer_fields(),
            require_terms: true,
            terms_text: None,
        }
    }
}

fn default_signer_fields() -> Vec<FieldSpec> {
    ["signer_name", "signer_id"]
        .into_iter()
        .map(|name| FieldSpec {
            name: name.to_string(),
            label: None,
            field_type: FieldType::Text,
            required: true,
            options: vec![],
            placeholder: None,
            help_text: None,
        })
        .collect()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct SignatureInput {
    step_id: String,
    config: SignatureConfig,
    values: BTreeMap<String, String>,
    signature_data: Option<String>,
    accepted_terms: bool,
}

impl SignatureInput {
    pub fn new(step_id: impl Into<String>, config: SignatureConfig) -> Self {
        Self {
            step_id: step_id.into(),
            config,
            values: BTreeMap::new(),
            signature_data: None,
            accepted_terms: false,
        }
    }

    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<(), CoreError> {
        if !self.config.signer_fields.iter().any(|f| f.name == name) {
            return Err(CoreError::Validation(format!(
                "Unknown signer field '{name}'"
            )));
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Encoded signature (drawn image as a data URL, or a typed signature).
    pub fn sign(&mut self, signature_data: impl Into<String>) {
        self.signature_data = Some(signature_data.into());
    }

    pub fn accept_terms(&mut self, accepted: bool) {
        self.accepted_terms = accepted;
    }
}

impl InputComponent for SignatureInput {
    fn step_id(&self) -> &str {
        &self.step_id
    }

    fn validate(&self) -> Result<(), CoreError> {
        let missing: Vec<&str> = self
            .config
            .signer_fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| self.values.get(&f.name).is_none_or(|v| v.trim().is_empty()))
            .map(|f| f.label())
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::Validation(format!(
                "Required fields missing: {}",
                missing.join(", ")
            )));
        }
        if self
            .signature_data
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
        {
            return Err(CoreError::Validation("A signature is required".to_string()));
        }
        if self.config.require_terms && !self.accepted_terms {
            return Err(CoreError::Validation(
                "The terms must be accepted before signing".to_string(),
            ));
        }
        Ok(())
    }

    /// Flat JSON of the signature fields only.
    fn to_payload(&self) -> Result<SubmitPayload, CoreError> {
        self.validate()?;
        let mut body = serde_json::Map::new();
        for (name, value) in &self.values {
            body.insert(name.clone(), serde_json::Value::String(value.clone()));
        }
        body.insert(
            "signature_data".to_string(),
            serde_json::Value::String(self.signature_data.clone().unwrap_or_default()),
        );
        body.insert(
            "accepted_terms".to_string(),
            serde_json::Value::Bool(self.accepted_terms),
        );
        body.insert(
            "signed_at".to_string(),
            serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
        );
        Ok(SubmitPayload::Json(serde_json::Value::Object(body)))
    }
}
