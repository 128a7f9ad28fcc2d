use civica_client::{ApiError, ConfigError};
use civica_core::CoreError;
use civica_query::QueryError;
use thiserror::Error;

use crate::tracking::TrackerError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::InvalidInput(err.message())
    }
}
