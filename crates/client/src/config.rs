use std::str::FromStr;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Read `var`, falling back to `default` when unset.
pub fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Read and parse `var`, falling back to `default` when unset or empty.
pub fn env_parse<T: FromStr>(
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var,
                value: raw,
                expected,
            })
        }
        _ => Ok(default),
    }
}

/// Backend connection settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin (default: `http://localhost:8000`).
    pub api_url: String,
    /// Path prefix of the API (default: `/api/v1`).
    pub api_base_url: String,
    /// Bearer token for the session, if any.
    pub api_token: Option<String>,
    /// TCP connect timeout; no overall request timeout is applied.
    pub connect_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            api_base_url: "/api/v1".into(),
            api_token: None,
            connect_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `API_URL`                  | `http://localhost:8000` |
    /// | `API_BASE_URL`             | `/api/v1`               |
    /// | `API_TOKEN`                | unset                   |
    /// | `API_CONNECT_TIMEOUT_SECS` | unset                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let api_url = env_or("API_URL", &defaults.api_url);
        let api_base_url = env_or("API_BASE_URL", &defaults.api_base_url);
        let api_token = std::env::var("API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let connect_timeout_secs = match std::env::var("API_CONNECT_TIMEOUT_SECS") {
            Ok(_) => Some(env_parse("API_CONNECT_TIMEOUT_SECS", 0u64, "u64")?),
            Err(_) => None,
        };

        Ok(Self {
            api_url,
            api_base_url,
            api_token,
            connect_timeout_secs,
        })
    }

    /// `api_url` and `api_base_url` joined with exactly one `/`.
    pub fn base_url(&self) -> String {
        join_url(&self.api_url, &self.api_base_url)
    }
}

/// Join two URL fragments with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}
