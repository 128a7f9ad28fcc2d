use std::time::Duration;

use civica_client::config::env_parse;
use civica_client::{ClientConfig, ConfigError};
use civica_core::pagination::DEFAULT_PAGE_SIZE;
use civica_query::{QueryConfig, DEFAULT_DEBOUNCE};

/// Console configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub client: ClientConfig,
    /// Poll interval of the instance tracking screen.
    pub track_poll_interval: Duration,
    /// Delay between a successful submit and the tracking refetch, giving
    /// the engine time to advance the workflow.
    pub submit_refresh_delay: Duration,
    pub search_debounce: Duration,
    /// Auto-refresh interval of the queue and inbox lists.
    pub list_refetch_interval: Duration,
    pub query: QueryConfig,
    pub default_page_size: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            track_poll_interval: Duration::from_secs(30),
            submit_refresh_delay: Duration::from_millis(2000),
            search_debounce: DEFAULT_DEBOUNCE,
            list_refetch_interval: Duration::from_secs(30),
            query: QueryConfig::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `TRACK_POLL_INTERVAL_SECS`   | `30`    |
    /// | `SUBMIT_REFRESH_DELAY_MS`    | `2000`  |
    /// | `SEARCH_DEBOUNCE_MS`         | `300`   |
    /// | `LIST_REFETCH_INTERVAL_SECS` | `30`    |
    /// | `QUERY_STALE_SECS`           | `0`     |
    /// | `QUERY_RETRY`                | `1`     |
    /// | `QUERY_CACHE_SECS`           | `300`   |
    /// | `DEFAULT_PAGE_SIZE`          | `10`    |
    ///
    /// Backend connection variables are read by [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let client = ClientConfig::from_env()?;

        let track_poll_interval = env_parse("TRACK_POLL_INTERVAL_SECS", 30u64, "u64")?;
        let submit_refresh_delay = env_parse("SUBMIT_REFRESH_DELAY_MS", 2000u64, "u64")?;
        let search_debounce = env_parse("SEARCH_DEBOUNCE_MS", 300u64, "u64")?;
        let list_refetch_interval = env_parse("LIST_REFETCH_INTERVAL_SECS", 30u64, "u64")?;
        let stale_secs = env_parse("QUERY_STALE_SECS", 0u64, "u64")?;
        let retry = env_parse("QUERY_RETRY", 1u32, "u32")?;
        let cache_secs = env_parse("QUERY_CACHE_SECS", 300u64, "u64")?;
        let default_page_size = env_parse("DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE, "u32")?;

        Ok(Self {
            client,
            track_poll_interval: Duration::from_secs(track_poll_interval),
            submit_refresh_delay: Duration::from_millis(submit_refresh_delay),
            search_debounce: Duration::from_millis(search_debounce),
            list_refetch_interval: Duration::from_secs(list_refetch_interval),
            query: QueryConfig {
                stale_time: Duration::from_secs(stale_secs),
                retry,
                cache_time: Duration::from_secs(cache_secs),
                ..QueryConfig::default()
            },
            default_page_size: default_page_size.max(1),
        })
    }

    /// `None` when the interval is configured as zero.
    pub fn list_refetch(&self) -> Option<Duration> {
        (!self.list_refetch_interval.is_zero()).then_some(self.list_refetch_interval)
    }
}
