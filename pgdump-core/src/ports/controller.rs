// pgdump-core/src/ports/controller.rs

use crate::error::MonitorError;

pub trait ProcessController: Send + Sync {
    /// Stops (SIGSTOP) the process. `Ok(false)` when it is already gone
    /// or the signal was not delivered.
    fn suspend(&self, pid: u32) -> Result<bool, MonitorError>;
}
