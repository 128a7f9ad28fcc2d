//! Domain core of the Civica admin console.
//!
//! Entity models mirrored from the workflow backend, status and
//! `waiting_for` interpretation, input-collection components, catalog
//! browse state and assignment-queue semantics. No I/O lives here.

pub mod catalog_view;
pub mod error;
pub mod input;
pub mod models;
pub mod pagination;
pub mod progress;
pub mod queue;
pub mod status;
pub mod tracking;
pub mod types;
pub mod waiting_for;

pub use error::CoreError;
pub use types::{EntityId, Timestamp};
