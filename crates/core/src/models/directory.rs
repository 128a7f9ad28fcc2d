//! Flat management entities: categories, teams and users.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub workflow_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub is_active: bool,
}

impl CategoryDraft {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name("Category", &self.name)?;
        if let Some(color) = &self.color {
            let hex = color.strip_prefix('#').unwrap_or("");
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(CoreError::Validation(format!(
                    "Color must be a #RRGGBB value, got '{color}'"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Member,
    Leader,
    Coordinator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: EntityId,
    pub role: TeamRole,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub joined_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub assigned_workflows: Vec<EntityId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Team {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn leaders(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter().filter(|m| m.role == TeamRole::Leader)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assigned_workflows: Vec<EntityId>,
    pub is_active: bool,
}

impl TeamDraft {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name("Team", &self.name)
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub team_ids: Vec<EntityId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDraft {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub roles: Vec<String>,
    pub is_active: bool,
}

impl UserDraft {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name("Username", &self.username)?;
        if let Some(email) = &self.email {
            let valid = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !valid {
                return Err(CoreError::Validation(format!("Invalid email '{email}'")));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Maximum length of a display name.
pub const MAX_NAME_LENGTH: usize = 200;

fn validate_name(what: &str, name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{what} name must not be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "{what} name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}
