//! The `waiting_for` discriminator reported on paused instances.
//!
//! The backend sends a bare string. It is decoded into a closed sum type with
//! an explicit [`WaitingFor::Unknown`] variant so that every value has a
//! defined input kind (see [`WaitingFor::input_kind`]).

use serde::{Deserialize, Serialize};

pub const WAITING_USER_INPUT: &str = "user_input";
pub const WAITING_SIGNATURE: &str = "signature";
pub const WAITING_CONTEXT_VALIDATION: &str = "context_validation";
pub const WAITING_CATALOG_SELECTION: &str = "catalog_selection";
pub const WAITING_ENTITY_SELECTION: &str = "entity_selection";

/// What a paused step is waiting for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WaitingFor {
    UserInput,
    Signature,
    ContextValidation,
    CatalogSelection,
    EntitySelection,
    /// A value this client does not know about, kept verbatim.
    Unknown(String),
}

/// The input-collection component to mount for a paused step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Form,
    Signature,
    ContextValidation,
    CatalogSelection,
    EntitySelection,
}

impl WaitingFor {
    pub fn parse(value: &str) -> Self {
        match value {
            WAITING_USER_INPUT => Self::UserInput,
            WAITING_SIGNATURE => Self::Signature,
            WAITING_CONTEXT_VALIDATION => Self::ContextValidation,
            WAITING_CATALOG_SELECTION => Self::CatalogSelection,
            WAITING_ENTITY_SELECTION => Self::EntitySelection,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::UserInput => WAITING_USER_INPUT,
            Self::Signature => WAITING_SIGNATURE,
            Self::ContextValidation => WAITING_CONTEXT_VALIDATION,
            Self::CatalogSelection => WAITING_CATALOG_SELECTION,
            Self::EntitySelection => WAITING_ENTITY_SELECTION,
            Self::Unknown(raw) => raw,
        }
    }

    /// Total mapping from discriminator to input component.
    ///
    /// Unrecognized values fall back to the generic form; callers can detect
    /// the fallback with [`WaitingFor::is_unknown`].
    pub fn input_kind(&self) -> InputKind {
        match self {
            Self::Signature => InputKind::Signature,
            Self::ContextValidation => InputKind::ContextValidation,
            Self::CatalogSelection => InputKind::CatalogSelection,
            Self::EntitySelection => InputKind::EntitySelection,
            Self::UserInput | Self::Unknown(_) => InputKind::Form,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl From<String> for WaitingFor {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<WaitingFor> for String {
    fn from(value: WaitingFor) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for WaitingFor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
