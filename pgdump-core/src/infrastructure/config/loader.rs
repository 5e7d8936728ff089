// pgdump-core/src/infrastructure/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::domain::configuration::MonitorConfig;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["pgdump-monitor.yaml", "pgdump_monitor.yaml"];

const ENV_METRICS_URL: &str = "PGDUMP_MONITOR_METRICS_URL";
const ENV_METRICS_USERNAME: &str = "PGDUMP_MONITOR_METRICS_USERNAME";
const ENV_METRICS_PASSWORD: &str = "PGDUMP_MONITOR_METRICS_PASSWORD";
const ENV_LOG_LEVEL: &str = "PGDUMP_MONITOR_LOG_LEVEL";
const ENV_BLOCKING: &str = "PGDUMP_MONITOR_BLOCKING";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: MonitorConfig,
    /// `None` when built-in defaults were used.
    pub source: Option<PathBuf>,
}

/// Explicit path must exist. Without one, the candidates are looked up in
/// `search_dir` and built-in defaults apply when none is present.
/// Environment overrides are applied before validation.
#[instrument(skip(search_dir))]
pub fn load_monitor_config(
    explicit: Option<&Path>,
    search_dir: &Path,
) -> Result<LoadedConfig, InfrastructureError> {
    let source = match explicit {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(path) => {
            return Err(InfrastructureError::ConfigNotFound(
                path.display().to_string(),
            ));
        }
        None => find_config(search_dir),
    };

    let mut config = match &source {
        Some(path) => {
            info!(path = ?path, "Loading monitor configuration");
            let content = fs::read_to_string(path)?;
            parse_config(&content)?
        }
        None => {
            info!("No configuration file found, using built-in defaults");
            MonitorConfig::default()
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(LoadedConfig { config, source })
}

fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists())
}

fn parse_config(content: &str) -> Result<MonitorConfig, InfrastructureError> {
    // An empty file is a valid "all defaults" document.
    if content.trim().is_empty() {
        return Ok(MonitorConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Layers `PGDUMP_MONITOR_*` values on top of the file. `lookup` is
/// `std::env::var` in production.
pub fn apply_env_overrides<F>(config: &mut MonitorConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_METRICS_URL) {
        info!(old = %config.metrics.url, new = %val, "Overriding metrics URL via ENV");
        config.metrics.url = val;
    }
    if let Some(val) = lookup(ENV_METRICS_USERNAME) {
        debug!("Overriding metrics username via ENV");
        config.metrics.username = Some(val);
    }
    if let Some(val) = lookup(ENV_METRICS_PASSWORD) {
        debug!("Overriding metrics password via ENV");
        config.metrics.password = Some(val);
    }
    if let Some(val) = lookup(ENV_LOG_LEVEL) {
        config.log.level = val;
    }
    if let Some(val) = lookup(ENV_BLOCKING) {
        let enabled = matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        info!(enabled, "Overriding blocking via ENV");
        config.blocking.enabled = enabled;
    }
}

/// Default configuration rendered as YAML, used by `init`.
pub fn default_config_yaml() -> Result<String, InfrastructureError> {
    let body = serde_yaml::to_string(&MonitorConfig::default())?;
    Ok(format!(
        "# pgdump-monitor configuration\n# Every section is optional; omitted keys keep these defaults.\n{}",
        body
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_when_no_file() -> Result<()> {
        let dir = tempdir()?;
        let loaded = load_monitor_config(None, dir.path())?;
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.postgres.ports, vec![5432, 5000, 5001]);
        Ok(())
    }

    #[test]
    fn test_discovers_candidate_file() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("pgdump_monitor.yaml"),
            "detection:\n  suspicion_threshold: 60\n  block_threshold: 90\n",
        )?;
        let loaded = load_monitor_config(None, dir.path())?;
        assert_eq!(
            loaded.source,
            Some(dir.path().join("pgdump_monitor.yaml"))
        );
        assert_eq!(loaded.config.detection.suspicion_threshold, 60);
        assert_eq!(loaded.config.detection.block_threshold, 90);
        Ok(())
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("nope.yaml");
        let result = load_monitor_config(Some(&missing), dir.path());
        assert!(matches!(result, Err(InfrastructureError::ConfigNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_invalid_values_fail_validation() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.yaml");
        fs::write(
            &path,
            "detection:\n  suspicion_threshold: 90\n  block_threshold: 10\n",
        )?;
        let result = load_monitor_config(Some(&path), dir.path());
        assert!(matches!(result, Err(InfrastructureError::Validation(_))));
        Ok(())
    }

    #[test]
    fn test_metrics_url_checked_only_when_enabled() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("metrics.yaml");

        fs::write(&path, "metrics:\n  enabled: false\n  url: \"not a url\"\n")?;
        let loaded = load_monitor_config(Some(&path), dir.path())?;
        assert!(!loaded.config.metrics.enabled);

        fs::write(&path, "metrics:\n  enabled: true\n  url: \"not a url\"\n")?;
        let result = load_monitor_config(Some(&path), dir.path());
        assert!(matches!(result, Err(InfrastructureError::Validation(_))));
        Ok(())
    }

    #[test]
    fn test_broken_yaml_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "postgres: [unclosed\n")?;
        let result = load_monitor_config(Some(&path), dir.path());
        assert!(matches!(result, Err(InfrastructureError::YamlError(_))));
        Ok(())
    }

    #[test]
    fn test_empty_file_means_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.yaml");
        fs::write(&path, "\n")?;
        let loaded = load_monitor_config(Some(&path), dir.path())?;
        assert_eq!(loaded.config.intervals.scan_ms, 1_000);
        Ok(())
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PGDUMP_MONITOR_METRICS_URL", "https://vm.internal/api/v1/import/prometheus"),
            ("PGDUMP_MONITOR_METRICS_USERNAME", "monitor"),
            ("PGDUMP_MONITOR_METRICS_PASSWORD", "hunter2"),
            ("PGDUMP_MONITOR_LOG_LEVEL", "debug"),
            ("PGDUMP_MONITOR_BLOCKING", "TRUE"),
        ]);
        let mut config = MonitorConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(
            config.metrics.url,
            "https://vm.internal/api/v1/import/prometheus"
        );
        assert_eq!(config.metrics.username.as_deref(), Some("monitor"));
        assert_eq!(config.metrics.password.as_deref(), Some("hunter2"));
        assert_eq!(config.log.level, "debug");
        assert!(config.blocking.enabled);
    }

    #[test]
    fn test_default_yaml_round_trips() -> Result<()> {
        let yaml = default_config_yaml()?;
        let parsed = parse_config(&yaml)?;
        assert_eq!(parsed.detection.block_threshold, 80);
        assert_eq!(parsed.metrics.metric_prefix, "pg_dump_monitor");
        Ok(())
    }
}
