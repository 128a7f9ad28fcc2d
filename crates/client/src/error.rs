//! Normalized errors of the backend API layer.

use civica_core::CoreError;

/// Coarse classification used to pick how an error is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never got a response.
    Transport,
    /// Rejected locally before any request was sent.
    Validation,
    /// 4xx with a human-readable detail.
    Rejected,
    /// 5xx, undecodable body, or anything else.
    Unexpected,
}

/// Errors from the backend API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Failed to {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A 2xx body did not match the expected shape.
    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Local validation failed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] CoreError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Api { status, .. } if (400..500).contains(status) => ErrorKind::Rejected,
            Self::Api { .. } | Self::Decode { .. } => ErrorKind::Unexpected,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message for an inline banner.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(e) => e.message(),
            other => other.to_string(),
        }
    }

    /// Build the error for a non-2xx response.
    pub(crate) fn from_response(operation: &'static str, status: u16, body: &str) -> Self {
        let message =
            extract_detail(body).unwrap_or_else(|| format!("Failed to {operation}"));
        Self::Api { status, message }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `detail` first (a string, or a list of `{msg}` objects as
/// produced by request-validation failures), then `message`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail") {
        Some(serde_json::Value::String(detail)) if !detail.trim().is_empty() => {
            return Some(detail.clone());
        }
        Some(serde_json::Value::Array(items)) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if !parts.is_empty() {
                return Some(parts.join("; "));
            }
        }
        _ => {}
    }
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}
