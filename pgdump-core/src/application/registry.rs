// pgdump-core/src/application/registry.rs

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::detection::{
    Assessment, CommandLineAnalysis, FileAnalysis, NetworkAnalysis, SystemCallProfile, Verdict,
};
use crate::domain::process::{NetworkConnection, OutputFile, ProcessKey, ProcessSnapshot};

/// A candidate process followed across scans.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedProcess {
    pub snapshot: ProcessSnapshot,
    pub first_seen: DateTime<Utc>,
    pub scan_count: u32,
    pub pattern_score: usize,
    pub matched_patterns: Vec<String>,
    pub matched_binary: Option<String>,
    pub command_line: CommandLineAnalysis,
    pub network: NetworkAnalysis,
    pub postgres_connections: Vec<NetworkConnection>,
    pub files: FileAnalysis,
    pub output_files: Vec<OutputFile>,
    pub dump_files: usize,
    pub syscalls: Option<SystemCallProfile>,
    pub assessment: Assessment,
    /// Highest verdict an alert was already raised for.
    pub alerted: Option<Verdict>,
    pub blocked: bool,
}

impl TrackedProcess {
    pub fn new(snapshot: ProcessSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            snapshot,
            first_seen: now,
            scan_count: 1,
            pattern_score: 0,
            matched_patterns: Vec::new(),
            matched_binary: None,
            command_line: CommandLineAnalysis::default(),
            network: NetworkAnalysis::default(),
            postgres_connections: Vec::new(),
            files: FileAnalysis::default(),
            output_files: Vec::new(),
            dump_files: 0,
            syscalls: None,
            assessment: Assessment::default(),
            alerted: None,
            blocked: false,
        }
    }

    /// First time suspicious, or escalated to `Block` since the last alert.
    pub fn needs_alert(&self) -> bool {
        let verdict = self.assessment.verdict;
        verdict.is_alerting() && self.alerted.is_none_or(|raised| verdict > raised)
    }
}

#[derive(Debug, Default)]
pub struct ProcessRegistry {
    processes: BTreeMap<ProcessKey, TrackedProcess>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new incarnation or bumps the scan count of a known one.
    /// The stored snapshot is replaced with the fresh one.
    pub fn observe(&mut self, snapshot: ProcessSnapshot, now: DateTime<Utc>) -> &mut TrackedProcess {
        match self.processes.entry(snapshot.key()) {
            Entry::Occupied(entry) => {
                let tracked = entry.into_mut();
                tracked.scan_count += 1;
                tracked.snapshot = snapshot;
                tracked
            }
            Entry::Vacant(entry) => entry.insert(TrackedProcess::new(snapshot, now)),
        }
    }

    /// Drops every key not in `live`. Returns what was dropped.
    pub fn retain_live(&mut self, live: &HashSet<ProcessKey>) -> Vec<TrackedProcess> {
        let gone: Vec<ProcessKey> = self
            .processes
            .keys()
            .filter(|k| !live.contains(k))
            .copied()
            .collect();
        gone.into_iter()
            .filter_map(|k| self.processes.remove(&k))
            .collect()
    }

    pub fn get(&self, key: &ProcessKey) -> Option<&TrackedProcess> {
        self.processes.get(key)
    }

    pub fn get_mut(&mut self, key: &ProcessKey) -> Option<&mut TrackedProcess> {
        self.processes.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedProcess> {
        self.processes.values()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn suspicious_count(&self) -> usize {
        self.iter()
            .filter(|p| p.assessment.verdict.is_alerting())
            .count()
    }

    pub fn alert_active(&self) -> bool {
        self.suspicious_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(pid: u32, start_time: u64) -> ProcessSnapshot {
        ProcessSnapshot {
            pid,
            start_time,
            name: "pg_dump".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_scan_count_and_pid_reuse() {
        let mut registry = ProcessRegistry::new();
        let now = Utc::now();

        registry.observe(snap(10, 100), now);
        let again = registry.observe(snap(10, 100), now);
        assert_eq!(again.scan_count, 2);

        // same pid, new start time: a different process
        let reused = registry.observe(snap(10, 200), now);
        assert_eq!(reused.scan_count, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_retain_live_drops_exited() {
        let mut registry = ProcessRegistry::new();
        let now = Utc::now();
        registry.observe(snap(1, 1), now);
        registry.observe(snap(2, 1), now);

        let live = HashSet::from([snap(2, 1).key()]);
        let gone = registry.retain_live(&live);
        assert_eq!(gone.len(), 1);
        assert_eq!(gone[0].snapshot.pid, 1);
        assert!(registry.get(&snap(2, 1).key()).is_some());
    }

    #[test]
    fn test_alert_once_then_on_escalation() {
        let mut tracked = TrackedProcess::new(snap(1, 1), Utc::now());
        assert!(!tracked.needs_alert());

        tracked.assessment.verdict = Verdict::Suspicious;
        assert!(tracked.needs_alert());
        tracked.alerted = Some(Verdict::Suspicious);
        assert!(!tracked.needs_alert());

        tracked.assessment.verdict = Verdict::Block;
        assert!(tracked.needs_alert());
        tracked.alerted = Some(Verdict::Block);

        // de-escalation does not re-alert
        tracked.assessment.verdict = Verdict::Suspicious;
        assert!(!tracked.needs_alert());
    }

    #[test]
    fn test_alert_active_follows_verdicts() {
        let mut registry = ProcessRegistry::new();
        let now = Utc::now();
        registry.observe(snap(1, 1), now);
        assert!(!registry.alert_active());

        registry.observe(snap(1, 1), now).assessment.verdict = Verdict::Block;
        assert!(registry.alert_active());
        assert_eq!(registry.suspicious_count(), 1);
    }
}
