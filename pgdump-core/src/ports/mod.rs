// pgdump-core/src/ports/mod.rs

// What the monitor needs from the host, without knowing how it is obtained.
// The scan cycle only talks to these traits; adapters live in infrastructure.

pub mod controller;
pub mod inspector;
pub mod journal;
pub mod metrics;
pub mod tracer;

pub use controller::ProcessController;
pub use inspector::ProcessInspector;
pub use journal::AlertJournal;
pub use metrics::MetricsSink;
pub use tracer::SyscallTracer;
