use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default lease duration handed to `try_lease`, in seconds.
pub const DEFAULT_LEASE_SECS: u64 = 300;
/// Default ceiling on lease acquisitions before a job is failed permanently.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default worker sleep between empty polls, in seconds.
pub const DEFAULT_POLL_SECS: u64 = 5;
/// Default scheduler tick interval, in seconds.
pub const DEFAULT_TICK_SECS: u64 = 60;

/// Top-level config (cadence.toml + CADENCE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            queue: QueueConfig::default(),
            worker: WorkerConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Lease and retry policy for the job queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// How long a lease lasts before it is considered abandoned.
    /// Override with env var: CADENCE_QUEUE_LEASE_SECS
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
    /// Lease acquisitions allowed before a job is failed permanently.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Worker sleep between polls that found no eligible job.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            lease_secs: DEFAULT_LEASE_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_secs: DEFAULT_POLL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Role tag prepended to each worker's random identity token.
    #[serde(default = "default_identity_prefix")]
    pub identity_prefix: String,
    /// Number of worker loops the daemon spawns.
    #[serde(default = "default_worker_count")]
    pub count: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            identity_prefix: default_identity_prefix(),
            count: default_worker_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between schedule-evaluation ticks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: DEFAULT_TICK_SECS,
        }
    }
}

fn default_lease_secs() -> u64 {
    DEFAULT_LEASE_SECS
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_poll_secs() -> u64 {
    DEFAULT_POLL_SECS
}
fn default_tick_secs() -> u64 {
    DEFAULT_TICK_SECS
}
fn default_identity_prefix() -> String {
    "worker".to_string()
}
fn default_worker_count() -> u32 {
    2
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.cadence/cadence.db", home)
}

impl CadenceConfig {
    /// Load config from a TOML file with CADENCE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.cadence/cadence.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: CadenceConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CADENCE_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.cadence/cadence.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = CadenceConfig::default();
        assert_eq!(config.queue.lease_secs, 300);
        assert_eq!(config.queue.max_attempts, 3);
        assert_eq!(config.scheduler.tick_secs, 60);
        assert_eq!(config.worker.identity_prefix, "worker");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = CadenceConfig::load(Some("/nonexistent/cadence.toml")).expect("load failed");
        assert_eq!(config.queue.max_attempts, 3);
    }
}
