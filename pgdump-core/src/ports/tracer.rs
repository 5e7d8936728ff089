// pgdump-core/src/ports/tracer.rs

use crate::domain::detection::SystemCallProfile;
use crate::error::MonitorError;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait SyscallTracer: Send + Sync {
    /// Attaches to `pid` for `duration` and summarizes what it saw.
    async fn trace(&self, pid: u32, duration: Duration) -> Result<SystemCallProfile, MonitorError>;
}
