// pgdump-core/src/ports/inspector.rs

use crate::domain::process::{NetworkConnection, OutputFile, ProcessSnapshot};
use crate::error::MonitorError;

/// Source of process, socket and open-file information.
pub trait ProcessInspector: Send {
    /// Re-reads the process list and the socket tables. Called once per scan;
    /// `connections` and `open_files` answer from that refresh.
    fn refresh(&mut self) -> Result<Vec<ProcessSnapshot>, MonitorError>;

    fn connections(&self, pid: u32) -> Result<Vec<NetworkConnection>, MonitorError>;

    /// Regular files the process holds open, pseudo files excluded.
    fn open_files(&self, pid: u32) -> Result<Vec<OutputFile>, MonitorError>;
}
