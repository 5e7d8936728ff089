// pgdump-core/src/infrastructure/adapters/host_inspector.rs

use std::path::PathBuf;

use sysinfo::{Process, ProcessRefreshKind, ProcessesToUpdate, System, Users};
use tracing::{debug, warn};

use crate::domain::process::{NetworkConnection, OutputFile, ProcessSnapshot};
use crate::error::MonitorError;
use crate::infrastructure::adapters::procfs::{ProcFs, SocketTable};
use crate::ports::ProcessInspector;

const UNKNOWN_USER: &str = "unknown";

/// `sysinfo` for the process list, `/proc` for sockets and descriptors.
pub struct HostInspector {
    system: System,
    users: Users,
    procfs: ProcFs,
    sockets: SocketTable,
}

impl Default for HostInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl HostInspector {
    pub fn new() -> Self {
        Self::with_procfs(ProcFs::new())
    }

    pub fn with_procfs(procfs: ProcFs) -> Self {
        Self {
            system: System::new(),
            users: Users::new_with_refreshed_list(),
            procfs,
            sockets: SocketTable::new(),
        }
    }

    fn snapshot(&self, process: &Process) -> ProcessSnapshot {
        let user = process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|u| u.name().to_string())
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        let disk = process.disk_usage();

        ProcessSnapshot {
            pid: process.pid().as_u32(),
            start_time: process.start_time(),
            exe: process.exe().map(PathBuf::from),
            name: process.name().to_string_lossy().into_owned(),
            args: process
                .cmd()
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            user,
            read_bytes: disk.total_read_bytes,
            written_bytes: disk.total_written_bytes,
        }
    }
}

impl ProcessInspector for HostInspector {
    fn refresh(&mut self) -> Result<Vec<ProcessSnapshot>, MonitorError> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );

        self.sockets = match self.procfs.socket_table() {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "Socket table unavailable, connections will be empty");
                SocketTable::new()
            }
        };

        let snapshots: Vec<ProcessSnapshot> = self
            .system
            .processes()
            .values()
            // Linux lists threads as tasks too
            .filter(|p| p.thread_kind().is_none())
            .map(|p| self.snapshot(p))
            .collect();

        debug!(
            processes = snapshots.len(),
            sockets = self.sockets.len(),
            "Host refreshed"
        );
        Ok(snapshots)
    }

    fn connections(&self, pid: u32) -> Result<Vec<NetworkConnection>, MonitorError> {
        Ok(self
            .procfs
            .socket_inodes(pid)
            .into_iter()
            .filter_map(|inode| self.sockets.get(&inode).cloned())
            .collect())
    }

    fn open_files(&self, pid: u32) -> Result<Vec<OutputFile>, MonitorError> {
        Ok(self.procfs.open_files(pid))
    }
}

/// Load average and memory, for the periodic health log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostHealth {
    pub load_one: f64,
    pub load_five: f64,
    pub load_fifteen: f64,
    pub used_memory: u64,
    pub total_memory: u64,
}

impl HostHealth {
    pub fn sample() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        let load = System::load_average();
        Self {
            load_one: load.one,
            load_five: load.five,
            load_fifteen: load.fifteen,
            used_memory: sys.used_memory(),
            total_memory: sys.total_memory(),
        }
    }

    pub fn memory_percent(&self) -> f64 {
        if self.total_memory == 0 {
            0.0
        } else {
            self.used_memory as f64 / self.total_memory as f64 * 100.0
        }
    }
}
