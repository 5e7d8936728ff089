// pgdump-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes through a sibling temp file then renames it over `path`, so readers
/// never see a half-written config.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;
    Ok(())
}

/// `init` helper: refuses to clobber an existing file unless `force`.
pub fn write_config_file(
    path: &Path,
    content: &str,
    force: bool,
) -> Result<(), InfrastructureError> {
    if path.exists() && !force {
        return Err(InfrastructureError::ConfigError(format!(
            "'{}' already exists (use --force to overwrite)",
            path.display()
        )));
    }
    atomic_write(path, content)
}
