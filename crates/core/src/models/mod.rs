//! Entity models mirrored from the backend API.
//!
//! The server owns every entity; these are read-mostly projections that are
//! re-fetched wholesale after any mutation.

pub mod assignment;
pub mod catalog;
pub mod directory;
pub mod document;
pub mod instance;
pub mod page;
pub mod workflow;

pub use assignment::{AssignRequest, Assignment, AssignmentListParams, AssignmentTarget};
pub use catalog::{
    CacheConfig, Catalog, CatalogDataPage, CatalogDataQuery, CatalogDraft, CatalogPermission,
    ColumnSchema, ColumnType, SortOrder, SourceConfig, SourceType, SyncResult,
};
pub use directory::{Category, CategoryDraft, Team, TeamDraft, TeamMember, TeamRole, User, UserDraft};
pub use document::{AdminDecision, AdminVerification, Document, VerificationAnalysis};
pub use instance::{InstanceListParams, WorkflowInstance};
pub use page::Page;
pub use workflow::{StepDefinition, WorkflowDefinition, WorkflowDraft};
