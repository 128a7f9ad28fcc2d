//! Civica admin console.
//!
//! Live views (instance tracking, catalog browsing, assignment queue) built
//! on the query cache, plus the `civica` command-line front end.

pub mod catalog_browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod keys;
pub mod queue;
pub mod tracking;

pub use catalog_browser::{BrowserState, CatalogBrowser, CatalogSource};
pub use config::ConsoleConfig;
pub use error::CliError;
pub use queue::{AssignmentQueue, LensView, QueueList, QueuePage, QueueRow};
pub use tracking::{InstanceTracker, TrackerError, TrackerSettings};
