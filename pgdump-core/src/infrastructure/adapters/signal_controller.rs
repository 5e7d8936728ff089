// pgdump-core/src/infrastructure/adapters/signal_controller.rs

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, Signal, System};
use tracing::warn;

use crate::error::MonitorError;
use crate::ports::ProcessController;

/// Delivers SIGSTOP through `sysinfo`.
#[derive(Debug, Default)]
pub struct SignalController;

impl ProcessController for SignalController {
    fn suspend(&self, pid: u32) -> Result<bool, MonitorError> {
        let pid = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing(),
        );

        let Some(process) = system.process(pid) else {
            return Ok(false);
        };
        match process.kill_with(Signal::Stop) {
            Some(delivered) => Ok(delivered),
            None => {
                warn!(%pid, "SIGSTOP is not supported on this platform");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_missing_process_is_not_suspended() -> Result<()> {
        // Above the default pid_max, never allocated.
        assert!(!SignalController.suspend(4_194_305)?);
        Ok(())
    }
}
