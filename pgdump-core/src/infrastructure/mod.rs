// pgdump-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod config;
pub mod error;
pub mod fs;
pub mod host;

pub use config::{LoadedConfig, load_monitor_config};
pub use error::InfrastructureError;
