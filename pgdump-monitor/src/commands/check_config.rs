// pgdump-monitor/src/commands/check_config.rs
//
// USE CASE: Validate a configuration file without touching the host.

use std::path::PathBuf;

use anyhow::Context;
use pgdump_core::application::Detector;

use super::load_config;

pub fn execute(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let loaded = load_config(config_path.as_deref())?;
    let config = &loaded.config;

    // Compiling the rules catches bad regexes the schema cannot see.
    Detector::new(config).context("Invalid detection rules")?;

    match &loaded.source {
        Some(path) => println!("✅ Configuration OK: {}", path.display()),
        None => println!("✅ No configuration file found, built-in defaults are valid"),
    }
    println!("   PostgreSQL ports : {:?}", config.postgres.ports);
    println!("   PostgreSQL hosts : {:?}", config.postgres.hosts);
    println!(
        "   Thresholds       : suspicious >= {}%, block >= {}%",
        config.detection.suspicion_threshold, config.detection.block_threshold
    );
    println!("   Scan interval    : {} ms", config.intervals.scan_ms);
    if config.metrics.enabled {
        println!("   Metrics          : push to {}", config.metrics.url);
    } else {
        println!("   Metrics          : disabled");
    }
    println!(
        "   Blocking         : {}",
        if config.blocking.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "   Syscall tracing  : {}",
        if config.syscalls.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
