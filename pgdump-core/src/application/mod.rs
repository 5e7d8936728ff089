// pgdump-core/src/application/mod.rs

pub mod health;
pub mod monitor;
pub mod probe;
pub mod registry;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_support;

// --- RE-EXPORTS (FACADE PATTERN) ---
// `use pgdump_core::application::{Monitor, ScanService, Detector};`

pub use health::log_host_health;
pub use monitor::{Monitor, RunSummary, Schedule};
pub use probe::{ProbeResult, ReachabilityProbe};
pub use registry::{ProcessRegistry, TrackedProcess};
pub use scan::{Detector, ProcessReport, ScanOptions, ScanReport, ScanService};
