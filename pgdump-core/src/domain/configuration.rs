// pgdump-core/src/domain/configuration.rs

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use validator::{Validate, ValidateUrl, ValidationError};

use crate::domain::units::MIB;

/// Root of `pgdump-monitor.yaml`. Every section is optional.
#[derive(Debug, Deserialize, Serialize, Clone, Default, Validate)]
#[serde(default)]
pub struct MonitorConfig {
    #[validate(nested)]
    pub postgres: PostgresConfig,

    #[validate(nested)]
    pub detection: DetectionConfig,

    #[validate(nested)]
    pub intervals: IntervalConfig,

    #[validate(nested)]
    pub network: NetworkConfig,

    #[validate(nested)]
    pub metrics: MetricsConfig,

    pub alerts: AlertConfig,

    pub blocking: BlockingConfig,

    #[validate(nested)]
    pub syscalls: SyscallConfig,

    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct PostgresConfig {
    /// PostgreSQL (5432) and HAProxy write/read (5000/5001) ports.
    #[validate(length(min = 1, message = "At least one PostgreSQL port is required"))]
    pub ports: Vec<u16>,
    /// Patroni members, HAProxy and loopback.
    pub hosts: Vec<String>,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            ports: vec![5432, 5000, 5001],
            hosts: vec![
                "10.0.1.10".to_string(),
                "10.0.1.11".to_string(),
                "10.0.1.12".to_string(),
                "10.0.1.5".to_string(),
                "localhost".to_string(),
                "127.0.0.1".to_string(),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ArgumentPattern {
    pub name: String,
    pub regex: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_thresholds"))]
pub struct DetectionConfig {
    pub pg_dump_paths: Vec<String>,

    #[validate(range(min = 1, message = "min_pattern_matches must be at least 1"))]
    pub min_pattern_matches: usize,

    pub data_threshold_bytes: u64,

    #[validate(range(min = 1, max = 100))]
    pub suspicion_threshold: u8,

    #[validate(range(min = 1, max = 100))]
    pub block_threshold: u8,

    #[validate(nested)]
    pub weights: ScoreWeights,

    /// Bytes per second of open-file growth considered a bulk export.
    pub io_rate_threshold_bytes: u64,

    /// Processes younger than this are flagged as short-lived.
    pub short_lived_secs: u64,

    pub extra_patterns: Vec<ArgumentPattern>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pg_dump_paths: vec![
                "/usr/pgsql-16/bin/pg_dump".to_string(),
                "pg_dump".to_string(),
                "/bin/pg_dump".to_string(),
                "/etc/alternative/pgsql-pg_dump".to_string(),
            ],
            min_pattern_matches: 3,
            data_threshold_bytes: 50 * MIB,
            suspicion_threshold: 50,
            block_threshold: 80,
            weights: ScoreWeights::default(),
            io_rate_threshold_bytes: 5 * MIB,
            short_lived_secs: 30,
            extra_patterns: vec![],
        }
    }
}

fn validate_thresholds(cfg: &DetectionConfig) -> Result<(), ValidationError> {
    if cfg.block_threshold < cfg.suspicion_threshold {
        let mut err = ValidationError::new("block_below_suspicion");
        err.message = Some(Cow::from(format!(
            "block_threshold ({}) must be >= suspicion_threshold ({})",
            cfg.block_threshold, cfg.suspicion_threshold
        )));
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct ScoreWeights {
    #[validate(range(max = 100))]
    pub identity: u8,
    #[validate(range(max = 100))]
    pub network: u8,
    #[validate(range(max = 100))]
    pub io: u8,
    #[validate(range(max = 100))]
    pub files: u8,
    #[validate(range(max = 100))]
    pub heuristics: u8,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            identity: 40,
            network: 30,
            io: 20,
            files: 10,
            heuristics: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct IntervalConfig {
    #[validate(range(min = 100))]
    pub scan_ms: u64,
    #[validate(range(min = 100))]
    pub probe_ms: u64,
    #[validate(range(min = 100))]
    pub health_ms: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            scan_ms: 1_000,
            probe_ms: 30_000,
            health_ms: 60_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct NetworkConfig {
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { timeout_ms: 3_000 }
    }
}

#[derive(Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_metrics_url"))]
pub struct MetricsConfig {
    pub enabled: bool,

    /// Only checked when `enabled`.
    pub url: String,

    pub metric_prefix: String,

    #[validate(range(min = 100))]
    pub push_interval_ms: u64,

    #[validate(range(min = 1))]
    pub timeout_ms: u64,

    pub username: Option<String>,

    pub password: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:8428/api/v1/import/prometheus".to_string(),
            metric_prefix: "pg_dump_monitor".to_string(),
            push_interval_ms: 15_000,
            timeout_ms: 5_000,
            username: None,
            password: None,
        }
    }
}

fn validate_metrics_url(cfg: &MetricsConfig) -> Result<(), ValidationError> {
    if cfg.enabled && !cfg.url.validate_url() {
        let mut err = ValidationError::new("url");
        err.message = Some(Cow::from(format!(
            "metrics.url must be an absolute URL, got '{}'",
            cfg.url
        )));
        return Err(err);
    }
    Ok(())
}

impl fmt::Debug for MetricsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("metric_prefix", &self.metric_prefix)
            .field("push_interval_ms", &self.push_interval_ms)
            .field("timeout_ms", &self.timeout_ms)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AlertConfig {
    pub journal_enabled: bool,
    pub directory: PathBuf,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            journal_enabled: true,
            directory: PathBuf::from("security_logs"),
        }
    }
}

/// SIGSTOP of processes reaching the block threshold. Off unless asked for.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct BlockingConfig {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct SyscallConfig {
    pub enabled: bool,
    #[validate(range(min = 100))]
    pub duration_ms: u64,
    pub strace_path: String,
}

impl Default for SyscallConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_ms: 3_000,
            strace_path: "strace".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
