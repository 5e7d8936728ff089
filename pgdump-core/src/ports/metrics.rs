// pgdump-core/src/ports/metrics.rs

use crate::error::MonitorError;
use async_trait::async_trait;

#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Sends one Prometheus text exposition body.
    async fn push(&self, body: &str) -> Result<(), MonitorError>;
}
