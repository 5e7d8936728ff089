// pgdump-core/src/application/health.rs

use tracing::debug;

use crate::domain::units::format_bytes;
use crate::infrastructure::adapters::HostHealth;

/// Samples load average and memory and logs them at debug level.
pub fn log_host_health() -> HostHealth {
    let health = HostHealth::sample();
    debug!(
        load_1m = health.load_one,
        load_5m = health.load_five,
        load_15m = health.load_fifteen,
        memory_used = %format_bytes(health.used_memory),
        memory_total = %format_bytes(health.total_memory),
        memory_percent = %format!("{:.1}", health.memory_percent()),
        "Host health"
    );
    health
}
