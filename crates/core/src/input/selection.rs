//! Catalog / entity selection input.
//!
//! Rows come from a catalog's data endpoint (browsed by the console's
//! catalog browser); this type only owns the selection and its count rules.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::input::payload::SubmitPayload;
use crate::input::InputComponent;

/// A catalog row as returned by the data endpoint.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Single,
    Multiple,
}

/// Which payload key the selection is submitted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// `<step_id>_selections`
    Catalog,
    /// `<step_id>_input`
    Entity,
}

/// `input_form` payload for catalog/entity selection steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub step_id: Option<String>,
    pub catalog_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(default = "default_min")]
    pub min_selections: u32,
    #[serde(default)]
    pub max_selections: Option<u32>,
    /// Columns shown in the selector table; empty shows every column.
    #[serde(default)]
    pub display_fields: Vec<String>,
    /// Column whose value identifies a row.
    #[serde(default = "default_value_field")]
    pub value_field: String,
}

fn default_min() -> u32 {
    1
}

fn default_value_field() -> String {
    "id".to_string()
}

/// Local selection state with count rules enforced on every change.
#[derive(Debug, Clone)]
pub struct SelectionInput {
    step_id: String,
    kind: SelectionKind,
    config: SelectionConfig,
    selected: Vec<Row>,
}

/// Message shown when fewer than `min` rows are selected.
pub fn min_message(min: u32) -> String {
    format!("Selecciona al menos {min}")
}

/// Message shown when the selection would exceed `max` rows.
pub fn max_message(max: u32) -> String {
    format!("Selecciona máximo {max}")
}

impl SelectionInput {
    pub fn new(step_id: impl Into<String>, kind: SelectionKind, config: SelectionConfig) -> Self {
        Self {
            step_id: step_id.into(),
            kind,
            config,
            selected: Vec::new(),
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn kind(&self) -> SelectionKind {
        self.kind
    }

    pub fn selected(&self) -> &[Row] {
        &self.selected
    }

    /// Effective lower bound.
    pub fn min(&self) -> u32 {
        match self.config.selection_mode {
            SelectionMode::Single => self.config.min_selections.min(1),
            SelectionMode::Multiple => self.config.min_selections,
        }
    }

    /// Effective upper bound; `None` is unbounded.
    pub fn max(&self) -> Option<u32> {
        match self.config.selection_mode {
            SelectionMode::Single => Some(1),
            SelectionMode::Multiple => self.config.max_selections,
        }
    }

    /// Identity of a row, taken from the configured value field.
    pub fn row_key(&self, row: &Row) -> Option<String> {
        row.get(&self.config.value_field).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn is_selected(&self, row: &Row) -> bool {
        let Some(key) = self.row_key(row) else {
            return false;
        };
        self.selected
            .iter()
            .any(|r| self.row_key(r).as_deref() == Some(key.as_str()))
    }

    /// Whether another row may be added without exceeding the maximum.
    pub fn can_add_more(&self) -> bool {
        self.max()
            .is_none_or(|max| (self.selected.len() as u32) < max)
    }

    /// Toggle a row.
    ///
    /// Single mode replaces any prior selection (toggling the selected row
    /// clears it). Multiple mode refuses additions past the maximum.
    pub fn toggle(&mut self, row: Row) -> Result<(), CoreError> {
        let key = self.row_key(&row).ok_or_else(|| {
            CoreError::Validation(format!(
                "Row has no '{}' value to identify it",
                self.config.value_field
            ))
        })?;

        if let Some(pos) = self
            .selected
            .iter()
            .position(|r| self.row_key(r).as_deref() == Some(key.as_str()))
        {
            self.selected.remove(pos);
            return Ok(());
        }

        match self.config.selection_mode {
            SelectionMode::Single => {
                self.selected.clear();
                self.selected.push(row);
            }
            SelectionMode::Multiple => {
                if !self.can_add_more() {
                    let max = self.max().unwrap_or_default();
                    return Err(CoreError::Validation(max_message(max)));
                }
                self.selected.push(row);
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// The message explaining why submit is disabled, if it is.
    pub fn blocking_message(&self) -> Option<String> {
        let count = self.selected.len() as u32;
        if count < self.min() {
            return Some(min_message(self.min()));
        }
        match self.max() {
            Some(max) if count > max => Some(max_message(max)),
            _ => None,
        }
    }

    /// `min ≤ |selection| ≤ max`.
    pub fn can_submit(&self) -> bool {
        self.blocking_message().is_none()
    }

    fn payload_key(&self) -> String {
        match self.kind {
            SelectionKind::Catalog => format!("{}_selections", self.step_id),
            SelectionKind::Entity => format!("{}_input", self.step_id),
        }
    }
}

impl InputComponent for SelectionInput {
    fn step_id(&self) -> &str {
        &self.step_id
    }

    fn validate(&self) -> Result<(), CoreError> {
        match self.blocking_message() {
            Some(msg) => Err(CoreError::Validation(msg)),
            None => Ok(()),
        }
    }

    fn to_payload(&self) -> Result<SubmitPayload, CoreError> {
        self.validate()?;
        let rows: Vec<serde_json::Value> = self
            .selected
            .iter()
            .cloned()
            .map(serde_json::Value::Object)
            .collect();
        let mut body = serde_json::Map::new();
        body.insert(self.payload_key(), serde_json::Value::Array(rows));
        Ok(SubmitPayload::Json(serde_json::Value::Object(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u32) -> Row {
        serde_json::json!({"id": id, "name": format!("row {id}")})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn multiple(min: u32, max: Option<u32>) -> SelectionInput {
        SelectionInput::new(
            "pick",
            SelectionKind::Catalog,
            SelectionConfig {
                step_id: None,
                catalog_id: "c1".into(),
                title: None,
                selection_mode: SelectionMode::Multiple,
                min_selections: min,
                max_selections: max,
                display_fields: vec![],
                value_field: "id".into(),
            },
        )
    }

    fn single() -> SelectionInput {
        let mut input = multiple(1, None);
        input.config.selection_mode = SelectionMode::Single;
        input
    }

    #[test]
    fn single_mode_replaces_selection() {
        let mut input = single();
        input.toggle(row(1)).unwrap();
        input.toggle(row(2)).unwrap();
        assert_eq!(input.selected().len(), 1);
        assert!(input.is_selected(&row(2)));
        assert!(!input.is_selected(&row(1)));
    }

    #[test]
    fn single_mode_toggle_clears() {
        let mut input = single();
        input.toggle(row(1)).unwrap();
        input.toggle(row(1)).unwrap();
        assert!(input.selected().is_empty());
        assert!(!input.can_submit());
    }

    #[test]
    fn submit_disabled_until_min_reached() {
        let mut input = multiple(2, Some(3));
        input.toggle(row(1)).unwrap();
        assert!(!input.can_submit());
        assert_eq!(input.blocking_message().unwrap(), "Selecciona al menos 2");
        input.toggle(row(2)).unwrap();
        assert!(input.can_submit());
    }

    #[test]
    fn additions_blocked_at_max() {
        let mut input = multiple(1, Some(2));
        input.toggle(row(1)).unwrap();
        input.toggle(row(2)).unwrap();
        assert!(!input.can_add_more());
        let err = input.toggle(row(3)).unwrap_err();
        assert_eq!(err.message(), "Selecciona máximo 2");
        assert_eq!(input.selected().len(), 2);
        // removing is still allowed at the maximum
        input.toggle(row(1)).unwrap();
        assert!(input.can_add_more());
    }

    #[test]
    fn bounds_hold_whenever_submit_is_enabled() {
        for (min, max) in [(0, Some(2)), (1, Some(1)), (2, Some(4)), (1, None)] {
            let mut input = multiple(min, max);
            for id in 0..6 {
                let _ = input.toggle(row(id));
                let n = input.selected().len() as u32;
                if input.can_submit() {
                    assert!(min <= n);
                    assert!(max.is_none_or(|m| n <= m));
                }
            }
        }
    }

    #[test]
    fn payload_keys_by_kind() {
        let mut input = multiple(1, None);
        input.toggle(row(7)).unwrap();
        let payload = input.to_payload().unwrap();
        assert_eq!(payload.part_names(), vec!["pick_selections"]);

        let mut entity = SelectionInput::new("who", SelectionKind::Entity, input.config.clone());
        entity.toggle(row(7)).unwrap();
        match entity.to_payload().unwrap() {
            SubmitPayload::Json(v) => assert_eq!(v["who_input"][0]["id"], 7),
            other => panic!("expected json, got {other:?}"),
        }
    }

    #[test]
    fn row_without_identity_rejected() {
        let mut input = single();
        let row = serde_json::json!({"name": "x"}).as_object().cloned().unwrap();
        assert!(input.toggle(row).is_err());
    }
}
