// pgdump-monitor/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pgdump-monitor")]
#[command(about = "Detects and reports pg_dump style exports of PostgreSQL data", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🛡️ Runs the monitor until Ctrl+C / SIGTERM
    Run {
        /// Configuration file (default: ./pgdump-monitor.yaml if present)
        #[arg(long, short, env = "PGDUMP_MONITOR_CONFIG")]
        config: Option<PathBuf>,
    },

    /// 🔎 Scans the host once and prints the candidates
    Scan {
        #[arg(long, short, env = "PGDUMP_MONITOR_CONFIG")]
        config: Option<PathBuf>,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// ✅ Loads and validates the configuration
    CheckConfig {
        #[arg(long, short, env = "PGDUMP_MONITOR_CONFIG")]
        config: Option<PathBuf>,
    },

    /// 📝 Writes a default configuration file
    Init {
        #[arg(long, default_value = "pgdump-monitor.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
