// pgdump-monitor/src/main.rs

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// `RUST_LOG` wins over the configured level. Logs go to stderr so that
/// `scan --json` keeps stdout machine readable.
pub(crate) fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // --- USE CASE: DAEMON ---
        Commands::Run { config } => commands::run::execute(config).await,

        // --- USE CASE: ONE-SHOT SCAN ---
        Commands::Scan { config, json } => commands::scan::execute(config, json).await,

        // --- USE CASE: CONFIG VALIDATION ---
        Commands::CheckConfig { config } => commands::check_config::execute(config),

        // --- USE CASE: SCAFFOLDING ---
        Commands::Init { path, force } => commands::init::execute(path, force),
    }
}
