// pgdump-core/src/lib.rs

// 1. Documentation is optional for now
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Process inspection, metrics sink, alert journal, process control, syscall tracing.
pub mod ports;

// 2. Domain (detection rules)
// Argument patterns, scoring, alerts, metric exposition.
// Depends on NOTHING else (neither infra nor app).
pub mod domain;

// 3. Infrastructure (Adapters)
// procfs, sysinfo, VictoriaMetrics, alert files, signals, strace, config files.
// Depends on Domain and Ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Scan cycle, monitor loop, probes.
// Depends on Domain, Infra and Ports.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use pgdump_core::MonitorError;
pub use error::MonitorError;
