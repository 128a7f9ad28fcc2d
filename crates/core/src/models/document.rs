//! Documents attached to instances and their verification analysis.
//!
//! The analysis is produced server-side (optionally by an AI model) and is
//! read-only here; the console only submits a human decision.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: EntityId,
    #[serde(default)]
    pub instance_id: Option<EntityId>,
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    pub status: String,
    #[serde(default)]
    pub uploaded_at: Option<Timestamp>,
}

/// Scores are probabilities in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationAnalysis {
    pub document_id: EntityId,
    pub confidence_score: f64,
    #[serde(default)]
    pub fraud_score: f64,
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub authenticity_score: f64,
    /// Model suggestion: `approve`, `reject` or `manual_review`.
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub extracted_fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub analyzed_at: Option<Timestamp>,
}

impl VerificationAnalysis {
    pub fn validate(&self) -> Result<(), CoreError> {
        let scores = [
            ("confidence_score", self.confidence_score),
            ("fraud_score", self.fraud_score),
            ("quality_score", self.quality_score),
            ("authenticity_score", self.authenticity_score),
        ];
        for (name, value) in scores {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(CoreError::Validation(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminDecision {
    Approve,
    Reject,
}

/// Body of `POST /admin/documents/{id}/admin-verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminVerification {
    pub decision: AdminDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl AdminVerification {
    /// A rejection must explain itself to the citizen.
    pub fn new(decision: AdminDecision, comments: Option<String>) -> Result<Self, CoreError> {
        let comments = comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if decision == AdminDecision::Reject && comments.is_none() {
            return Err(CoreError::Validation(
                "A rejection requires comments".to_string(),
            ));
        }
        Ok(Self { decision, comments })
    }
}
