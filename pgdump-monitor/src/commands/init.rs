// pgdump-monitor/src/commands/init.rs
//
// USE CASE: Scaffold a configuration file with every default spelled out.

use std::path::PathBuf;

use anyhow::Context;
use pgdump_core::infrastructure::config::default_config_yaml;
use pgdump_core::infrastructure::fs::write_config_file;

pub fn execute(path: PathBuf, force: bool) -> anyhow::Result<()> {
    let content = default_config_yaml().context("Cannot render the default configuration")?;
    write_config_file(&path, &content, force)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✨ Configuration written to {}", path.display());
    println!("👉 Next: pgdump-monitor check-config --config {}", path.display());
    Ok(())
}
