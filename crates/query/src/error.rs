use std::error::Error as StdError;
use std::sync::Arc;

use crate::key::QueryKey;

/// Errors surfaced by the query cache. Cheap to clone so one failure can be
/// handed to every caller sharing a fetch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    /// The fetcher failed (after retries).
    #[error("{0}")]
    Fetch(Arc<dyn StdError + Send + Sync>),

    /// The key was reused with a different value type.
    #[error("Cached value for {0} has an unexpected type")]
    TypeMismatch(QueryKey),

    #[error("Query cancelled")]
    Cancelled,
}

impl QueryError {
    pub fn fetch<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        Self::Fetch(Arc::new(error))
    }

    /// The fetcher's own error, if it has type `E`.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Fetch(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}
