// pgdump-monitor/src/commands/run.rs
//
// USE CASE: Run the monitor as a daemon.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use pgdump_core::application::{Monitor, ReachabilityProbe};
use pgdump_core::infrastructure::adapters::{NoopMetricsSink, VictoriaMetricsSink};
use pgdump_core::infrastructure::host::hostname;
use pgdump_core::ports::MetricsSink;
use tracing::{error, info, warn};

use super::{ScanMode, build_scan_service, load_config};

pub async fn execute(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let loaded = load_config(config_path.as_deref())?;
    crate::init_tracing(&loaded.config.log.level);
    let config = loaded.config;

    let host = hostname();
    info!(
        host = %host,
        config = ?loaded.source,
        blocking = config.blocking.enabled,
        metrics = config.metrics.enabled,
        syscalls = config.syscalls.enabled,
        "Starting pgdump-monitor"
    );
    if config.blocking.enabled {
        warn!("Blocking is enabled: processes reaching the block threshold will be stopped");
    }

    let sink: Arc<dyn MetricsSink> = if config.metrics.enabled {
        info!(url = %config.metrics.url, "Pushing metrics to VictoriaMetrics");
        Arc::new(
            VictoriaMetricsSink::new(&config.metrics)
                .context("Failed to initialize the metrics client")?,
        )
    } else {
        Arc::new(NoopMetricsSink)
    };

    let scanner = build_scan_service(&config, host, ScanMode::Enforcing)?;
    let monitor = Monitor::new(scanner, ReachabilityProbe::new(&config), sink, &config);
    let summary = monitor.run(shutdown_signal()).await;

    println!(
        "✨ Stopped after {} scans, {} alerts ({} failed scans, {} failed pushes)",
        summary.scans, summary.alerts, summary.failed_scans, summary.failed_pushes
    );
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
