//! Typed wrappers over the backend resource groups.
//!
//! Each service owns a clone of the shared [`HttpClient`](crate::http::HttpClient)
//! and maps one operation to one request. No cross-service logic lives here.

pub mod admin;
pub mod assignments;
pub mod catalogs;
pub mod categories;
pub mod documents;
pub mod instances;
pub mod teams;
pub mod users;
pub mod workflows;

pub use admin::{AdminService, DashboardStats};
pub use assignments::AssignmentsService;
pub use catalogs::{CatalogsService, ConnectionTest};
pub use categories::CategoriesService;
pub use documents::DocumentsService;
pub use instances::InstancesService;
pub use teams::TeamsService;
pub use users::UsersService;
pub use workflows::{WorkflowListParams, WorkflowsService};
