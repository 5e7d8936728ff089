// pgdump-monitor/src/commands/mod.rs

pub mod check_config;
pub mod init;
pub mod run;
pub mod scan;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pgdump_core::application::{Detector, ScanOptions, ScanService};
use pgdump_core::domain::MonitorConfig;
use pgdump_core::infrastructure::adapters::{
    DisabledJournal, HostInspector, JsonLinesJournal, SignalController, StraceTracer,
};
use pgdump_core::infrastructure::{LoadedConfig, load_monitor_config};
use pgdump_core::ports::{AlertJournal, SyscallTracer};

/// `--config` if given, otherwise discovery in the working directory.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<LoadedConfig> {
    let cwd = std::env::current_dir().context("Cannot determine the working directory")?;
    load_monitor_config(explicit, &cwd).with_context(|| match explicit {
        Some(path) => format!("Failed to load configuration from {:?}", path),
        None => format!("Failed to load configuration from {:?}", cwd),
    })
}

/// What a scan is allowed to do besides looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Alerts are journaled, blocking follows the configuration.
    Enforcing,
    /// No journal writes, never blocks.
    DryRun,
}

pub fn build_scan_service(
    config: &MonitorConfig,
    host: String,
    mode: ScanMode,
) -> anyhow::Result<ScanService> {
    let detector = Detector::new(config).context("Invalid detection rules")?;

    let journal: Arc<dyn AlertJournal> = match mode {
        ScanMode::Enforcing if config.alerts.journal_enabled => {
            Arc::new(JsonLinesJournal::new(&config.alerts.directory))
        }
        _ => Arc::new(DisabledJournal),
    };
    let tracer: Option<Arc<dyn SyscallTracer>> = if config.syscalls.enabled {
        Some(Arc::new(StraceTracer::new(&config.syscalls.strace_path)))
    } else {
        None
    };

    Ok(ScanService::new(
        detector,
        Box::new(HostInspector::new()),
        journal,
        Arc::new(SignalController),
        tracer,
        ScanOptions {
            host,
            blocking_enabled: mode == ScanMode::Enforcing && config.blocking.enabled,
            trace_duration: Duration::from_millis(config.syscalls.duration_ms),
        },
    ))
}
