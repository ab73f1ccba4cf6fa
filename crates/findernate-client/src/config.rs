//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration against a local development backend.

use std::path::PathBuf;
use std::time::Duration;

use findernate_shared::constants::{
    COUNTS_REFRESH_INTERVAL_SECS, DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS,
    PENDING_MESSAGE_TTL_SECS, QUEUE_SWEEP_INTERVAL_SECS, SIGNAL_POLL_INTERVAL_MS,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend.
    /// Env: `FINDERNATE_API_URL`
    /// Default: `http://localhost:4000/api/v1`
    pub api_base_url: String,

    /// Per-request HTTP timeout.
    /// Env: `FINDERNATE_HTTP_TIMEOUT_SECS`
    /// Default: 15 s
    pub http_timeout: Duration,

    /// Fallback polling interval of the unread / request counters.
    /// Env: `FINDERNATE_COUNTS_REFRESH_SECS`
    /// Default: 300 s
    pub counts_refresh_interval: Duration,

    /// How often stale pending messages are swept.
    /// Env: `FINDERNATE_QUEUE_SWEEP_SECS`
    /// Default: 30 s
    pub queue_sweep_interval: Duration,

    /// Age after which a pending message is considered lost.
    /// Env: `FINDERNATE_PENDING_TTL_SECS`
    /// Default: 120 s
    pub pending_ttl: Duration,

    /// Path of the local store. `None` selects the platform data directory.
    /// Env: `FINDERNATE_DATA_PATH`
    pub data_path: Option<PathBuf>,

    /// Whether events are relayed to other client processes via the store.
    /// Env: `FINDERNATE_CROSS_PROCESS` (true/false)
    /// Default: `true`
    pub cross_process_events: bool,

    /// Poll interval of the cross-process event transport.
    /// Env: `FINDERNATE_SIGNAL_POLL_MS`
    /// Default: 1000 ms
    pub signal_poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            counts_refresh_interval: Duration::from_secs(COUNTS_REFRESH_INTERVAL_SECS),
            queue_sweep_interval: Duration::from_secs(QUEUE_SWEEP_INTERVAL_SECS),
            pending_ttl: Duration::from_secs(PENDING_MESSAGE_TTL_SECS),
            data_path: None,
            cross_process_events: true,
            signal_poll_interval: Duration::from_millis(SIGNAL_POLL_INTERVAL_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("FINDERNATE_API_URL") {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.api_base_url = url;
            } else {
                tracing::warn!(value = %url, "Invalid FINDERNATE_API_URL, using default");
            }
        }

        if let Some(secs) = parse_positive(&lookup, "FINDERNATE_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_positive(&lookup, "FINDERNATE_COUNTS_REFRESH_SECS") {
            config.counts_refresh_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_positive(&lookup, "FINDERNATE_QUEUE_SWEEP_SECS") {
            config.queue_sweep_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_positive(&lookup, "FINDERNATE_PENDING_TTL_SECS") {
            config.pending_ttl = Duration::from_secs(secs);
        }

        if let Some(path) = lookup("FINDERNATE_DATA_PATH") {
            if !path.is_empty() {
                config.data_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("FINDERNATE_CROSS_PROCESS") {
            config.cross_process_events = val != "false" && val != "0";
        }

        if let Some(ms) = parse_positive(&lookup, "FINDERNATE_SIGNAL_POLL_MS") {
            config.signal_poll_interval = Duration::from_millis(ms);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn parse_positive<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid duration setting, using default");
            None
        }
    }
}
