// pgdump-core/src/infrastructure/config/mod.rs

pub mod loader;

pub use crate::domain::configuration::MonitorConfig;
pub use loader::{
    CONFIG_FILE_CANDIDATES, LoadedConfig, apply_env_overrides, default_config_yaml,
    load_monitor_config,
};
