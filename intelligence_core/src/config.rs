use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
pub const DEFAULT_METRICS_POLL_INTERVAL_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct IntelligenceConfig {
    /// Base URL of the REST API (e.g. http://localhost:8000).
    pub api_base_url: String,
    /// Real-time channel URL (e.g. ws://localhost:8000/ws).
    pub socket_url: String,
    /// Room/scope identifier joined on the real-time channel (team or hub id).
    pub room: String,
    pub api_key: Option<String>,
    /// Fixed delay before a reconnect attempt after the socket closes.
    pub reconnect_delay_ms: u64,
    /// Metrics polling period; runs regardless of socket connectivity.
    pub metrics_poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for IntelligenceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            socket_url: "ws://127.0.0.1:8000/ws".to_string(),
            room: "default".to_string(),
            api_key: None,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            metrics_poll_interval_ms: DEFAULT_METRICS_POLL_INTERVAL_MS,
            request_timeout_ms: 10_000,
        }
    }
}

impl IntelligenceConfig {
    /// Defaults overridden by `INTELLIGENCE_*` environment variables.
    #[tracing::instrument(level = "debug")]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("INTELLIGENCE_API_URL") {
            cfg.api_base_url = v;
        }
        if let Some(v) = non_empty("INTELLIGENCE_WS_URL") {
            cfg.socket_url = v;
        }
        if let Some(v) = non_empty("INTELLIGENCE_ROOM") {
            cfg.room = v;
        }
        if let Some(v) = non_empty("INTELLIGENCE_API_KEY") {
            cfg.api_key = Some(v);
        }
        for (key, slot) in [
            ("INTELLIGENCE_RECONNECT_DELAY_MS", &mut cfg.reconnect_delay_ms),
            ("INTELLIGENCE_POLL_INTERVAL_MS", &mut cfg.metrics_poll_interval_ms),
            ("INTELLIGENCE_REQUEST_TIMEOUT_MS", &mut cfg.request_timeout_ms),
        ] {
            if let Some(v) = non_empty(key) {
                *slot = v
                    .trim()
                    .parse()
                    .map_err(|_| Error::Config(format!("{key} must be an integer, got {v:?}")))?;
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::Config("api_base_url is empty".to_string()));
        }
        if self.socket_url.trim().is_empty() {
            return Err(Error::Config("socket_url is empty".to_string()));
        }
        if self.room.trim().is_empty() {
            return Err(Error::Config("room is empty".to_string()));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(Error::Config("reconnect_delay_ms must be > 0".to_string()));
        }
        if self.metrics_poll_interval_ms == 0 {
            return Err(Error::Config(
                "metrics_poll_interval_ms must be > 0".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config("request_timeout_ms must be > 0".to_string()));
        }
        if !(15_000..=30_000).contains(&self.metrics_poll_interval_ms) {
            tracing::debug!(
                interval_ms = self.metrics_poll_interval_ms,
                "metrics poll interval outside the usual 15-30s range"
            );
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn metrics_poll_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
