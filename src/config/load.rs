//! Run configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::pool::WorkerPoolConfig;
use crate::core::job::Target;
use crate::core::smtp::DEFAULT_HELO_NAME;

/// Everything a load run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Target server address or hostname.
    pub host: String,
    /// Target server port.
    pub port: u16,
    /// Total number of messages to send.
    pub count: u64,
    /// Worker pool size.
    pub concurrency: usize,
    /// Approximate aggregate ceiling, in messages per second.
    pub rate: f64,
    /// Per-message network timeout, in seconds.
    pub timeout_secs: u64,
    /// Sender identity.
    pub from: String,
    /// Recipient identity.
    pub to: String,
    /// Bypass the private-address gate.
    pub allow_non_private: bool,
    /// Emit a progress line every this many completions (0 disables).
    pub progress_every: u64,
    /// Name announced in EHLO/HELO.
    pub helo_name: String,
    /// Bound on jobs queued ahead of the workers.
    pub max_queue_depth: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            host: "192.168.123.200".to_string(),
            port: 1025,
            count: 10_000,
            concurrency: 20,
            rate: 200.0,
            timeout_secs: 10,
            from: "test@local".to_string(),
            to: "someone@example.com".to_string(),
            allow_non_private: false,
            progress_every: 500,
            helo_name: DEFAULT_HELO_NAME.to_string(),
            max_queue_depth: crate::config::pool::DEFAULT_MAX_QUEUE_DEPTH,
        }
    }
}

impl LoadConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target host and port.
    #[must_use]
    pub fn with_target(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Set the number of messages.
    #[must_use]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    /// Set the worker pool size.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the rate ceiling.
    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Set the per-message timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set sender and recipient identities.
    #[must_use]
    pub fn with_envelope(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = from.into();
        self.to = to.into();
        self
    }

    /// Allow or forbid non-private targets.
    #[must_use]
    pub fn with_allow_non_private(mut self, allow: bool) -> Self {
        self.allow_non_private = allow;
        self
    }

    /// Set the progress interval.
    #[must_use]
    pub fn with_progress_every(mut self, every: u64) -> Self {
        self.progress_every = every;
        self
    }

    /// Set the EHLO/HELO name.
    #[must_use]
    pub fn with_helo_name(mut self, helo_name: impl Into<String>) -> Self {
        self.helo_name = helo_name.into();
        self
    }

    /// Per-message timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Destination for every job of the run.
    #[must_use]
    pub fn target(&self) -> Target {
        Target {
            host: self.host.clone(),
            port: self.port,
            timeout: self.timeout(),
        }
    }

    /// Pool settings derived from this run.
    #[must_use]
    pub fn pool_config(&self) -> WorkerPoolConfig {
        WorkerPoolConfig::new()
            .with_worker_count(self.concurrency)
            .with_max_queue_depth(self.max_queue_depth)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".into());
        }
        if self.count == 0 {
            return Err("count must be greater than 0".into());
        }
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".into());
        }
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(format!("rate must be a positive number, got {}", self.rate));
        }
        if self.timeout_secs == 0 {
            return Err("timeout must be greater than 0".into());
        }
        if self.from.trim().is_empty() || self.to.trim().is_empty() {
            return Err("from and to must not be empty".into());
        }
        if self.helo_name.trim().is_empty() {
            return Err("helo_name must not be empty".into());
        }
        self.pool_config()
            .validate()
            .map_err(|e| format!("pool invalid: {e}"))
    }

    /// Parse a run configuration from a JSON string and validate it. Missing
    /// fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
