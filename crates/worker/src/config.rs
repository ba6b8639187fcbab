use std::time::Duration;

use bestiary_pipeline::OrchestratorConfig;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Seconds between queue polls (default: `10`).
    pub poll_interval_secs: u64,
    /// Seconds a claim stays exclusive before another worker may take the
    /// row (default: `900`). Must exceed the longest expected generation.
    pub lease_secs: u64,
    /// Stat-block requests allowed per run when output does not parse
    /// (default: `3`).
    pub max_parse_attempts: u32,
    /// Base delay between parse attempts in milliseconds (default: `1000`).
    pub parse_retry_backoff_ms: u64,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `WORKER_POLL_INTERVAL_SECS` | `10`    |
    /// | `WORKER_LEASE_SECS`         | `900`   |
    /// | `MAX_PARSE_ATTEMPTS`        | `3`     |
    /// | `PARSE_RETRY_BACKOFF_MS`    | `1000`  |
    pub fn from_env() -> Self {
        Self {
            poll_interval_secs: env_or("WORKER_POLL_INTERVAL_SECS", 10),
            lease_secs: env_or("WORKER_LEASE_SECS", 900),
            max_parse_attempts: env_or("MAX_PARSE_ATTEMPTS", 3),
            parse_retry_backoff_ms: env_or("PARSE_RETRY_BACKOFF_MS", 1000),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_parse_attempts: self.max_parse_attempts,
            parse_retry_backoff: Duration::from_millis(self.parse_retry_backoff_ms),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
