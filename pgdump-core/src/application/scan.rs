// pgdump-core/src/application/scan.rs

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike, Utc};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::application::registry::{ProcessRegistry, TrackedProcess};
use crate::domain::alert::SecurityAlert;
use crate::domain::configuration::MonitorConfig;
use crate::domain::detection::files::is_dump_file;
use crate::domain::detection::{
    ArgumentScanner, BinaryMatcher, CommandLineAnalysis, Evidence, FileAnalysis,
    HeuristicAnalysis, HeuristicInput, NetworkAnalysis, PostgresEndpoints, SuspicionScorer,
    Verdict,
};
use crate::domain::metrics::MonitorStatus;
use crate::domain::process::{ProcessKey, ProcessSnapshot};
use crate::error::MonitorError;
use crate::ports::{AlertJournal, ProcessController, ProcessInspector, SyscallTracer};

/// The compiled detection rules.
pub struct Detector {
    arguments: ArgumentScanner,
    binaries: BinaryMatcher,
    endpoints: PostgresEndpoints,
    scorer: SuspicionScorer,
    min_pattern_matches: usize,
    data_threshold: u64,
    io_rate_threshold: u64,
    short_lived_secs: u64,
}

impl Detector {
    pub fn new(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let detection = &config.detection;
        Ok(Self {
            arguments: ArgumentScanner::new(&detection.extra_patterns)?,
            binaries: BinaryMatcher::new(&detection.pg_dump_paths),
            endpoints: PostgresEndpoints::new(&config.postgres),
            scorer: SuspicionScorer::new(detection),
            min_pattern_matches: detection.min_pattern_matches,
            data_threshold: detection.data_threshold_bytes,
            io_rate_threshold: detection.io_rate_threshold_bytes,
            short_lived_secs: detection.short_lived_secs,
        })
    }

    /// Known binary or at least one argument pattern.
    pub fn is_candidate(&self, process: &ProcessSnapshot) -> bool {
        self.binaries.is_match(process) || self.arguments.count_matches(&process.arguments()) > 0
    }
}

/// Per-process line of a scan report.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub pid: u32,
    pub user: String,
    pub command: String,
    pub arguments: String,
    pub scan_count: u32,
    pub score: u8,
    pub verdict: Verdict,
    pub reasons: Vec<String>,
    pub matched_patterns: Vec<String>,
    pub dump_scope: &'static str,
    pub connections: usize,
    pub postgres_connections: usize,
    pub external_connections: usize,
    pub open_file_bytes: u64,
    pub large_output_files: usize,
    pub suspicious_locations: usize,
    pub command_line: CommandLineAnalysis,
    pub blocked: bool,
}

impl From<&TrackedProcess> for ProcessReport {
    fn from(tracked: &TrackedProcess) -> Self {
        Self {
            pid: tracked.snapshot.pid,
            user: tracked.snapshot.user.clone(),
            command: tracked.snapshot.command(),
            arguments: tracked.snapshot.arguments(),
            scan_count: tracked.scan_count,
            score: tracked.assessment.score,
            verdict: tracked.assessment.verdict,
            reasons: tracked.assessment.reasons.clone(),
            matched_patterns: tracked.matched_patterns.clone(),
            dump_scope: tracked.command_line.dump_scope(),
            connections: tracked.network.total_connections,
            postgres_connections: tracked.network.postgres_connections,
            external_connections: tracked.network.external_connections,
            open_file_bytes: tracked.files.total_output_bytes,
            large_output_files: tracked.files.large_dump_files,
            suspicious_locations: tracked.files.suspicious_locations,
            command_line: tracked.command_line.clone(),
            blocked: tracked.blocked,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub timestamp: DateTime<Utc>,
    pub host: String,
    pub processes_scanned: usize,
    pub candidates: Vec<ProcessReport>,
    pub alerts: Vec<SecurityAlert>,
    pub alert_active: bool,
    pub suspicious_processes: usize,
}

impl ScanReport {
    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            alert_active: self.alert_active,
            suspicious_processes: self.suspicious_processes,
            last_scan: self.timestamp.timestamp(),
        }
    }
}

pub struct ScanOptions {
    pub host: String,
    pub blocking_enabled: bool,
    pub trace_duration: Duration,
}

/// One scan cycle plus the state carried between cycles.
pub struct ScanService {
    detector: Detector,
    inspector: Box<dyn ProcessInspector>,
    journal: Arc<dyn AlertJournal>,
    controller: Arc<dyn ProcessController>,
    tracer: Option<Arc<dyn SyscallTracer>>,
    registry: ProcessRegistry,
    options: ScanOptions,
    own_pid: u32,
}

impl ScanService {
    pub fn new(
        detector: Detector,
        inspector: Box<dyn ProcessInspector>,
        journal: Arc<dyn AlertJournal>,
        controller: Arc<dyn ProcessController>,
        tracer: Option<Arc<dyn SyscallTracer>>,
        options: ScanOptions,
    ) -> Self {
        Self {
            detector,
            inspector,
            journal,
            controller,
            tracer,
            registry: ProcessRegistry::new(),
            options,
            own_pid: std::process::id(),
        }
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn host(&self) -> &str {
        &self.options.host
    }

    #[instrument(skip(self), fields(host = %self.options.host))]
    pub async fn scan_once(&mut self) -> Result<ScanReport, MonitorError> {
        let snapshots = self.inspector.refresh()?;
        let now = Utc::now();
        let local_hour = Local::now().hour();

        let mut live = HashSet::new();
        let mut alerts = Vec::new();
        let mut candidates = 0usize;

        for snapshot in &snapshots {
            if snapshot.pid == self.own_pid || !self.detector.is_candidate(snapshot) {
                continue;
            }
            candidates += 1;
            live.insert(snapshot.key());

            let key = snapshot.key();
            self.evaluate(snapshot.clone(), now, local_hour).await;

            let needs_alert = self
                .registry
                .get(&key)
                .is_some_and(TrackedProcess::needs_alert);
            if needs_alert {
                if let Some(alert) = self.raise_alert(&key) {
                    alerts.push(alert);
                }
            }
        }

        for gone in self.registry.retain_live(&live) {
            debug!(pid = gone.snapshot.pid, scans = gone.scan_count, "Tracked process exited");
        }

        let report = ScanReport {
            timestamp: now,
            host: self.options.host.clone(),
            processes_scanned: snapshots.len(),
            candidates: self.registry.iter().map(ProcessReport::from).collect(),
            alerts,
            alert_active: self.registry.alert_active(),
            suspicious_processes: self.registry.suspicious_count(),
        };
        debug!(
            scanned = report.processes_scanned,
            candidates,
            suspicious = report.suspicious_processes,
            "Scan complete"
        );
        Ok(report)
    }

    async fn evaluate(&mut self, snapshot: ProcessSnapshot, now: DateTime<Utc>, local_hour: u32) {
        let pid = snapshot.pid;
        let arguments = snapshot.arguments();
        let command = snapshot.command();

        let matched_patterns: Vec<String> = self
            .detector
            .arguments
            .matched_names(&arguments)
            .into_iter()
            .map(str::to_string)
            .collect();
        let pattern_score = matched_patterns.len();
        let matched_binary = self.detector.binaries.matched_path(&snapshot).map(str::to_string);
        let command_line = CommandLineAnalysis::analyze(
            &command,
            &arguments,
            pattern_score,
            self.detector.min_pattern_matches,
        );

        let connections = self.inspector.connections(pid).unwrap_or_else(|e| {
            warn!(pid, error = %e, "Cannot read process connections");
            Vec::new()
        });
        let network = NetworkAnalysis::summarize(&self.detector.endpoints, &connections);
        let postgres_connections: Vec<_> = connections
            .into_iter()
            .filter(|c| self.detector.endpoints.is_postgres_connection(c))
            .collect();

        let output_files = self.inspector.open_files(pid).unwrap_or_else(|e| {
            warn!(pid, error = %e, "Cannot read open files");
            Vec::new()
        });
        let files = FileAnalysis::summarize(&output_files, self.detector.data_threshold);
        let open_file_bytes = files.total_output_bytes;
        let dump_files = output_files.iter().filter(|f| is_dump_file(&f.path)).count();

        let heuristics = HeuristicAnalysis::evaluate(
            &HeuristicInput {
                start_time: snapshot.start_time,
                now: now.timestamp().max(0) as u64,
                local_hour,
                output_bytes: open_file_bytes.max(snapshot.written_bytes),
            },
            self.detector.io_rate_threshold,
            self.detector.short_lived_secs,
        );

        let tracked = self.registry.observe(snapshot, now);
        let mut evidence = Evidence {
            pattern_score,
            matched_binary: matched_binary.clone(),
            likely_renamed: command_line.likely_renamed,
            postgres_connections: network.postgres_connections,
            external_connections: network.external_connections,
            open_file_bytes,
            dump_files,
            suspicious_locations: files.suspicious_locations,
            output_to_file: command_line.output_to_file,
            output_to_remote: command_line.output_to_remote,
            all_databases: command_line.all_databases,
            heuristics,
            syscalls: tracked.syscalls.clone(),
        };
        let mut assessment = self.detector.scorer.assess(&evidence);

        // Traced once per incarnation, and only once it already looks suspicious.
        if assessment.verdict.is_alerting() && tracked.syscalls.is_none() {
            if let Some(tracer) = &self.tracer {
                match tracer.trace(pid, self.options.trace_duration).await {
                    Ok(profile) => {
                        evidence.syscalls = Some(profile.clone());
                        tracked.syscalls = Some(profile);
                        assessment = self.detector.scorer.assess(&evidence);
                    }
                    Err(e) => warn!(pid, error = %e, "Syscall tracing failed"),
                }
            }
        }

        if tracked.scan_count == 1 {
            info!(
                pid,
                user = %tracked.snapshot.user,
                command = %tracked.snapshot.command_line(),
                score = assessment.score,
                verdict = %assessment.verdict,
                scope = command_line.dump_scope(),
                patterns = ?matched_patterns,
                "New pg_dump candidate"
            );
        }

        tracked.pattern_score = pattern_score;
        tracked.matched_patterns = matched_patterns;
        tracked.matched_binary = matched_binary;
        tracked.command_line = command_line;
        tracked.network = network;
        tracked.postgres_connections = postgres_connections;
        tracked.files = files;
        tracked.output_files = output_files;
        tracked.dump_files = dump_files;
        tracked.assessment = assessment;
    }

    /// Optionally stops the process, then logs and journals the alert.
    fn raise_alert(&mut self, key: &ProcessKey) -> Option<SecurityAlert> {
        let blocking = self.options.blocking_enabled;
        let tracked = self.registry.get_mut(key)?;
        let verdict = tracked.assessment.verdict;

        if blocking && verdict == Verdict::Block && !tracked.blocked {
            match self.controller.suspend(tracked.snapshot.pid) {
                Ok(true) => {
                    tracked.blocked = true;
                    info!(pid = tracked.snapshot.pid, "Process stopped with SIGSTOP");
                }
                Ok(false) => error!(pid = tracked.snapshot.pid, "SIGSTOP was not delivered"),
                Err(e) => error!(pid = tracked.snapshot.pid, error = %e, "Failed to stop process"),
            }
        }

        let mut alert = SecurityAlert::new(
            &tracked.snapshot,
            &tracked.assessment,
            tracked.postgres_connections.clone(),
            tracked.output_files.clone(),
            &self.options.host,
        );
        alert.blocked = tracked.blocked;
        tracked.alerted = Some(verdict);

        warn!("{}", alert);
        if let Err(e) = self.journal.record(&alert) {
            error!(error = %e, "Failed to journal security alert");
        }
        Some(alert)
    }
}
