//! Generic data-collection form.
//!
//! Mounted for `user_input` steps and as the fallback for any unrecognized
//! `waiting_for` value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::input::payload::{FilePart, SubmitPayload};
use crate::input::InputComponent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Number,
    Email,
    Date,
    Select,
    Checkbox,
    File,
}

/// A select option. Accepts either a bare string or `{value, label}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    Plain(String),
    Labeled { value: String, label: String },
}

impl FieldOption {
    pub fn value(&self) -> &str {
        match self {
            Self::Plain(v) => v,
            Self::Labeled { value, .. } => value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Plain(v) => v,
            Self::Labeled { label, .. } => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", alias = "field_type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
}

impl FieldSpec {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// `input_form` payload for generic form steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub step_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Local state of a generic form.
#[derive(Debug, Clone)]
pub struct FormInput {
    step_id: String,
    config: FormConfig,
    values: BTreeMap<String, String>,
    files: BTreeMap<String, FilePart>,
    fallback: bool,
}

impl FormInput {
    pub fn new(step_id: impl Into<String>, config: FormConfig) -> Self {
        Self {
            step_id: step_id.into(),
            config,
            values: BTreeMap::new(),
            files: BTreeMap::new(),
            fallback: false,
        }
    }

    /// A form mounted because the step kind was not recognized.
    pub fn fallback(step_id: impl Into<String>, config: FormConfig) -> Self {
        Self {
            fallback: true,
            ..Self::new(step_id, config)
        }
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// A form without declared fields accepts arbitrary field names.
    fn is_free_form(&self) -> bool {
        self.config.fields.is_empty()
    }

    fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.config.fields.iter().find(|f| f.name == name)
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<(), CoreError> {
        match self.spec(name) {
            Some(spec) if spec.field_type == FieldType::File => {
                return Err(CoreError::Validation(format!(
                    "Field '{name}' expects a file"
                )));
            }
            Some(_) => {}
            None if self.is_free_form() => {}
            None => {
                return Err(CoreError::Validation(format!("Unknown field '{name}'")));
            }
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn attach_file(&mut self, file: FilePart) -> Result<(), CoreError> {
        match self.spec(&file.field) {
            Some(spec) if spec.field_type != FieldType::File => {
                return Err(CoreError::Validation(format!(
                    "Field '{}' does not accept files",
                    file.field
                )));
            }
            Some(_) => {}
            None if self.is_free_form() => {}
            None => {
                return Err(CoreError::Validation(format!(
                    "Unknown field '{}'",
                    file.field
                )));
            }
        }
        self.files.insert(file.field.clone(), file);
        Ok(())
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Required fields that have no value (or no file) yet.
    pub fn missing_required(&self) -> Vec<&FieldSpec> {
        self.config
            .fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| match f.field_type {
                FieldType::File => !self.files.contains_key(&f.name),
                FieldType::Checkbox => self.value(&f.name) != Some("true"),
                _ => self.value(&f.name).is_none_or(|v| v.trim().is_empty()),
            })
            .collect()
    }

    fn check_value(spec: &FieldSpec, value: &str) -> Result<(), CoreError> {
        if value.trim().is_empty() {
            return Ok(());
        }
        match spec.field_type {
            FieldType::Number if value.trim().parse::<f64>().is_err() => Err(
                CoreError::Validation(format!("{} must be a number", spec.label())),
            ),
            FieldType::Email if !value.contains('@') => Err(CoreError::Validation(format!(
                "{} must be an email address",
                spec.label()
            ))),
            FieldType::Date if chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() => {
                Err(CoreError::Validation(format!(
                    "{} must be a date (YYYY-MM-DD)",
                    spec.label()
                )))
            }
            FieldType::Select
                if !spec.options.is_empty() && !spec.options.iter().any(|o| o.value() == value) =>
            {
                Err(CoreError::Validation(format!(
                    "{} must be one of the listed options",
                    spec.label()
                )))
            }
            _ => Ok(()),
        }
    }
}

impl InputComponent for FormInput {
    fn step_id(&self) -> &str {
        &self.step_id
    }

    fn validate(&self) -> Result<(), CoreError> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(|f| f.label()).collect();
            return Err(CoreError::Validation(format!(
                "Required fields missing: {}",
                labels.join(", ")
            )));
        }
        for (name, value) in &self.values {
            if let Some(spec) = self.spec(name) {
                Self::check_value(spec, value)?;
            }
        }
        Ok(())
    }

    fn to_payload(&self) -> Result<SubmitPayload, CoreError> {
        self.validate()?;
        // Declared fields first in form order, then free-form extras.
        let mut fields: Vec<(String, String)> = Vec::with_capacity(self.values.len());
        for spec in &self.config.fields {
            if let Some(value) = self.values.get(&spec.name) {
                fields.push((spec.name.clone(), value.clone()));
            }
        }
        for (name, value) in &self.values {
            if self.spec(name).is_none() {
                fields.push((name.clone(), value.clone()));
            }
        }
        Ok(SubmitPayload::Multipart {
            fields,
            files: self.files.values().cloned().collect(),
        })
    }
}
