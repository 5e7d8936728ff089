// pgdump-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(pgdump::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- /proc ---
    #[error("Malformed {source_name} entry: {detail}")]
    #[diagnostic(
        code(pgdump::infra::procfs),
        help("The kernel table layout was not recognised.")
    )]
    ProcFormat { source_name: String, detail: String },

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(pgdump::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(pgdump::infra::config))]
    ConfigError(String),

    #[error("Monitor configuration not found at '{0}'")]
    #[diagnostic(code(pgdump::infra::config_missing))]
    ConfigNotFound(String),

    #[error("Invalid configuration:\n{0}")]
    #[diagnostic(
        code(pgdump::infra::validation),
        help("Fix the listed fields in pgdump-monitor.yaml.")
    )]
    Validation(#[from] validator::ValidationErrors),

    // --- JSON ---
    #[error("JSON Encoding Error: {0}")]
    #[diagnostic(code(pgdump::infra::json))]
    Json(#[from] serde_json::Error),

    // --- METRICS PUSH ---
    #[error("HTTP Error: {0}")]
    #[diagnostic(
        code(pgdump::infra::http),
        help("Check that the metrics endpoint is reachable.")
    )]
    Http(#[from] reqwest::Error),

    #[error("Metrics endpoint rejected the push with status {status}")]
    #[diagnostic(
        code(pgdump::infra::metrics_rejected),
        help("Check metrics.url and the credentials.")
    )]
    MetricsRejected { status: u16 },

    // --- EXTERNAL TOOLS ---
    #[error("Failed to run '{tool}': {reason}")]
    #[diagnostic(code(pgdump::infra::tool))]
    ToolFailed { tool: String, reason: String },
}
