// pgdump-core/src/application/test_support.rs

// In-memory ports for application tests.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::alert::SecurityAlert;
use crate::domain::detection::SystemCallProfile;
use crate::domain::process::{NetworkConnection, OutputFile, ProcessSnapshot, TcpState};
use crate::error::MonitorError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::{AlertJournal, MetricsSink, ProcessController, ProcessInspector, SyscallTracer};

#[derive(Clone, Default)]
pub struct FakeHost {
    processes: Arc<Mutex<Vec<ProcessSnapshot>>>,
    connections: Arc<Mutex<HashMap<u32, Vec<NetworkConnection>>>>,
    files: Arc<Mutex<HashMap<u32, Vec<OutputFile>>>>,
    unreadable: Arc<AtomicBool>,
}

impl FakeHost {
    pub fn set_processes(&self, processes: Vec<ProcessSnapshot>) {
        if let Ok(mut guard) = self.processes.lock() {
            *guard = processes;
        }
    }

    pub fn set_connections(&self, pid: u32, connections: Vec<NetworkConnection>) {
        if let Ok(mut guard) = self.connections.lock() {
            guard.insert(pid, connections);
        }
    }

    pub fn set_files(&self, pid: u32, files: Vec<OutputFile>) {
        if let Ok(mut guard) = self.files.lock() {
            guard.insert(pid, files);
        }
    }

    /// Makes `refresh` fail until reset, like a vanished `/proc`.
    pub fn set_unreadable(&self, unreadable: bool) {
        self.unreadable.store(unreadable, Ordering::SeqCst);
    }
}

impl ProcessInspector for FakeHost {
    fn refresh(&mut self) -> Result<Vec<ProcessSnapshot>, MonitorError> {
        if self.unreadable.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("process table unavailable").into());
        }
        Ok(self.processes.lock().map(|p| p.clone()).unwrap_or_default())
    }

    fn connections(&self, pid: u32) -> Result<Vec<NetworkConnection>, MonitorError> {
        Ok(self
            .connections
            .lock()
            .ok()
            .and_then(|m| m.get(&pid).cloned())
            .unwrap_or_default())
    }

    fn open_files(&self, pid: u32) -> Result<Vec<OutputFile>, MonitorError> {
        Ok(self
            .files
            .lock()
            .ok()
            .and_then(|m| m.get(&pid).cloned())
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct RecordingJournal {
    alerts: Mutex<Vec<SecurityAlert>>,
}

impl RecordingJournal {
    pub fn count(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }
}

impl AlertJournal for RecordingJournal {
    fn record(&self, alert: &SecurityAlert) -> Result<(), MonitorError> {
        if let Ok(mut guard) = self.alerts.lock() {
            guard.push(alert.clone());
        }
        Ok(())
    }
}

/// Rejects every alert, like a full disk.
pub struct FailingJournal;

impl AlertJournal for FailingJournal {
    fn record(&self, _alert: &SecurityAlert) -> Result<(), MonitorError> {
        Err(InfrastructureError::Io(std::io::Error::other("disk full")).into())
    }
}

#[derive(Default)]
pub struct CountingController {
    pub calls: AtomicUsize,
}

impl ProcessController for CountingController {
    fn suspend(&self, _pid: u32) -> Result<bool, MonitorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

pub struct CannedTracer(pub SystemCallProfile);

#[async_trait]
impl SyscallTracer for CannedTracer {
    async fn trace(
        &self,
        _pid: u32,
        _duration: Duration,
    ) -> Result<SystemCallProfile, MonitorError> {
        Ok(self.0.clone())
    }
}

pub fn pg_dump(pid: u32) -> ProcessSnapshot {
    ProcessSnapshot {
        pid,
        start_time: 1_000,
        exe: Some(PathBuf::from("/usr/pgsql-16/bin/pg_dump")),
        name: "pg_dump".to_string(),
        args: ["pg_dump", "-h", "10.0.1.10", "-p", "5432", "-U", "postgres", "-d", "crm"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        user: "postgres".to_string(),
        ..Default::default()
    }
}

pub fn bash(pid: u32) -> ProcessSnapshot {
    ProcessSnapshot {
        pid,
        start_time: 1_000,
        exe: Some(PathBuf::from("/usr/bin/bash")),
        name: "bash".to_string(),
        args: vec!["bash".to_string()],
        user: "alice".to_string(),
        ..Default::default()
    }
}

pub fn pg_connection() -> NetworkConnection {
    NetworkConnection {
        local_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        local_port: 50122,
        remote_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 1, 10)),
        remote_port: 5432,
        state: TcpState::Established,
    }
}

/// Keeps every pushed body.
#[derive(Default)]
pub struct RecordingSink {
    pub bodies: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MetricsSink for RecordingSink {
    async fn push(&self, body: &str) -> Result<(), MonitorError> {
        if let Ok(mut guard) = self.bodies.lock() {
            guard.push(body.to_string());
        }
        Ok(())
    }
}
