// pgdump-core/src/application/monitor.rs

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{error, info, warn};

use crate::application::health::log_host_health;
use crate::application::probe::ReachabilityProbe;
use crate::application::scan::ScanService;
use crate::domain::configuration::MonitorConfig;
use crate::domain::metrics::{AlertStateTracker, MetricsReport, MonitorStatus};
use crate::ports::MetricsSink;

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub scan: Duration,
    pub probe: Duration,
    pub health: Duration,
    pub push: Duration,
}

impl Schedule {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            scan: Duration::from_millis(config.intervals.scan_ms),
            probe: Duration::from_millis(config.intervals.probe_ms),
            health: Duration::from_millis(config.intervals.health_ms),
            push: Duration::from_millis(config.metrics.push_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub scans: u64,
    pub failed_scans: u64,
    pub alerts: u64,
    pub pushes: u64,
    pub failed_pushes: u64,
}

/// The daemon: periodic scans, probes, health logs and metric pushes.
pub struct Monitor {
    scanner: ScanService,
    probe: ReachabilityProbe,
    sink: Arc<dyn MetricsSink>,
    metric_prefix: String,
    schedule: Schedule,
    tracker: AlertStateTracker,
    status: Option<MonitorStatus>,
    summary: RunSummary,
}

impl Monitor {
    pub fn new(
        scanner: ScanService,
        probe: ReachabilityProbe,
        sink: Arc<dyn MetricsSink>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            scanner,
            probe,
            sink,
            metric_prefix: config.metrics.metric_prefix.clone(),
            schedule: Schedule::from_config(config),
            tracker: AlertStateTracker::default(),
            status: None,
            summary: RunSummary::default(),
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// One scan; pushes immediately when the alert state flips.
    pub async fn tick_scan(&mut self) {
        self.summary.scans += 1;
        match self.scanner.scan_once().await {
            Ok(report) => {
                self.summary.alerts += report.alerts.len() as u64;
                let status = report.status();
                self.status = Some(status);
                if self.tracker.observe(status.alert_active) {
                    info!(
                        alert_active = status.alert_active,
                        suspicious = status.suspicious_processes,
                        "Alert state changed"
                    );
                    self.push_status().await;
                }
            }
            Err(e) => {
                self.summary.failed_scans += 1;
                error!(error = %e, "Scan failed");
            }
        }
    }

    /// Pushes the current state. Nothing to push before the first scan.
    pub async fn push_status(&mut self) {
        let Some(status) = self.status else {
            return;
        };
        let report = MetricsReport {
            prefix: &self.metric_prefix,
            host: self.scanner.host(),
        };
        let body = match report.render(&status, Utc::now().timestamp_millis()) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Cannot render metrics");
                return;
            }
        };

        self.summary.pushes += 1;
        if let Err(e) = self.sink.push(&body).await {
            self.summary.failed_pushes += 1;
            warn!(error = %e, "Metrics push failed");
        }
    }

    /// Runs until `shutdown` resolves. The tick in progress when it fires
    /// completes, then a final push reports the last state.
    pub async fn run<F>(mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        let schedule = self.schedule;
        info!(
            scan_ms = schedule.scan.as_millis() as u64,
            probe_ms = schedule.probe.as_millis() as u64,
            push_ms = schedule.push.as_millis() as u64,
            probe_targets = self.probe.targets().len(),
            "pg_dump monitor started"
        );

        let mut scan_tick = interval(schedule.scan);
        let mut probe_tick = interval(schedule.probe);
        let mut health_tick = interval(schedule.health);
        let mut push_tick = interval_at(Instant::now() + schedule.push, schedule.push);
        for tick in [&mut scan_tick, &mut probe_tick, &mut health_tick, &mut push_tick] {
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = scan_tick.tick() => self.tick_scan().await,
                _ = probe_tick.tick() => {
                    let results = self.probe.run().await;
                    let down = results.iter().filter(|r| !r.reachable).count();
                    if down > 0 {
                        warn!(unreachable = down, total = results.len(), "PostgreSQL endpoints unreachable");
                    }
                }
                _ = health_tick.tick() => {
                    log_host_health();
                }
                _ = push_tick.tick() => self.push_status().await,
            }
        }

        self.push_status().await;
        info!(
            scans = self.summary.scans,
            alerts = self.summary.alerts,
            "pg_dump monitor stopped"
        );
        self.summary
    }
}
