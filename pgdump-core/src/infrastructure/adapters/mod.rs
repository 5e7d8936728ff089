// pgdump-core/src/infrastructure/adapters/mod.rs

pub mod alert_journal;
pub mod host_inspector;
pub mod procfs;
pub mod signal_controller;
pub mod strace;
pub mod victoria_metrics;

pub use alert_journal::{DisabledJournal, JsonLinesJournal};
pub use host_inspector::{HostHealth, HostInspector};
pub use procfs::ProcFs;
pub use signal_controller::SignalController;
pub use strace::StraceTracer;
pub use victoria_metrics::{NoopMetricsSink, VictoriaMetricsSink};
