// pgdump-core/src/infrastructure/adapters/strace.rs

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, Signal, System};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::domain::detection::SystemCallProfile;
use crate::error::MonitorError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::SyscallTracer;

const DETACH_GRACE: Duration = Duration::from_secs(2);

/// Attaches `strace` to a live process for a fixed window.
pub struct StraceTracer {
    program: String,
}

impl StraceTracer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn failure(&self, reason: impl Into<String>) -> MonitorError {
        InfrastructureError::ToolFailed {
            tool: self.program.clone(),
            reason: reason.into(),
        }
        .into()
    }
}

#[async_trait]
impl SyscallTracer for StraceTracer {
    #[instrument(skip(self))]
    async fn trace(&self, pid: u32, duration: Duration) -> Result<SystemCallProfile, MonitorError> {
        let mut child = Command::new(&self.program)
            .args(["-f", "-p", &pid.to_string(), "-e", "trace=network,file,read,write"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.failure(e.to_string()))?;

        // strace writes the trace on stderr
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| self.failure("stderr not captured"))?;
        let reader = tokio::spawn(async move {
            let mut out = String::new();
            let _ = stderr.read_to_string(&mut out).await;
            out
        });

        let early_exit = tokio::select! {
            status = child.wait() => Some(status?),
            _ = tokio::time::sleep(duration) => None,
        };

        if early_exit.is_none() {
            // SIGINT lets strace detach cleanly; the tracee keeps running.
            if let Some(id) = child.id() {
                interrupt(id);
            }
            if tokio::time::timeout(DETACH_GRACE, child.wait()).await.is_err() {
                child.kill().await?;
            }
        }

        let output = reader
            .await
            .map_err(|e| self.failure(format!("reader task: {}", e)))?;

        if let Some(status) = early_exit {
            if !status.success() {
                let tail = output.lines().last().unwrap_or("no output").to_string();
                return Err(self.failure(format!("exited with {}: {}", status, tail)));
            }
        }

        let profile = SystemCallProfile::from_output(&output);
        debug!(
            pid,
            connects = profile.postgres_connects,
            reads = profile.read_calls,
            writes = profile.write_calls,
            "Syscall trace finished"
        );
        Ok(profile)
    }
}

fn interrupt(pid: u32) {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing(),
    );
    if let Some(process) = system.process(pid) {
        let _ = process.kill_with(Signal::Interrupt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let tracer = StraceTracer::new("/nonexistent/strace-binary");
        let result = tracer.trace(1, Duration::from_millis(100)).await;
        assert!(matches!(
            result,
            Err(MonitorError::Infrastructure(InfrastructureError::ToolFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_failing_tool_is_reported() {
        // `false` exits non-zero immediately, like strace without ptrace rights.
        let tracer = StraceTracer::new("false");
        let result = tracer.trace(1, Duration::from_secs(5)).await;
        assert!(matches!(
            result,
            Err(MonitorError::Infrastructure(InfrastructureError::ToolFailed { .. }))
        ));
    }
}
