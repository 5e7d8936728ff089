pub mod alert;
pub mod configuration;
pub mod detection;
pub mod error;
pub mod metrics;
pub mod process;
pub mod units;

// Re-exports to keep imports short elsewhere
pub use alert::{AlertSeverity, SecurityAlert};
pub use configuration::MonitorConfig;
pub use error::DomainError;
pub use process::{NetworkConnection, OutputFile, ProcessKey, ProcessSnapshot, TcpState};
pub use metrics::{AlertStateTracker, MetricSample, MetricsReport, MonitorStatus};
