// pgdump-core/src/domain/detection/files.rs

use crate::domain::process::OutputFile;
use serde::Serialize;
use std::path::Path;

const DUMP_EXTENSIONS: &[&str] = &[".sql", ".dump", ".backup", ".bak"];
const STAGING_DIRS: &[&str] = &["/tmp/", "/dev/shm/", "/var/tmp/"];

pub fn is_dump_file(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    has_dump_extension(&lower) || lower.contains("dump") || lower.contains("backup")
}

fn has_dump_extension(lower: &str) -> bool {
    DUMP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Under a world-writable staging area, or a dump inside a home tree.
pub fn is_suspicious_location(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    if STAGING_DIRS.iter().any(|dir| lower.starts_with(dir)) {
        return true;
    }
    match lower.strip_prefix("/home/") {
        Some(rest) => rest.contains('/') && has_dump_extension(rest),
        None => false,
    }
}

/// Pseudo files never count as output.
pub fn is_ignored_path(path: &Path) -> bool {
    path.starts_with("/proc") || path.starts_with("/dev") || path.starts_with("/sys")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileAnalysis {
    pub total_output_files: usize,
    pub total_output_bytes: u64,
    pub large_dump_files: usize,
    pub suspicious_locations: usize,
}

impl FileAnalysis {
    pub fn summarize(files: &[OutputFile], large_threshold: u64) -> Self {
        Self {
            total_output_files: files.len(),
            total_output_bytes: files.iter().map(|f| f.size).sum(),
            large_dump_files: files.iter().filter(|f| f.size > large_threshold).count(),
            suspicious_locations: files
                .iter()
                .filter(|f| is_suspicious_location(&f.path))
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_dump_file_names() {
        assert!(is_dump_file(Path::new("/srv/out/crm.SQL")));
        assert!(is_dump_file(Path::new("/srv/out/nightly.bak")));
        assert!(is_dump_file(Path::new("/srv/pg_dump_2024/part1")));
        assert!(is_dump_file(Path::new("/mnt/backups/file")));
        assert!(!is_dump_file(Path::new("/var/lib/app/data.bin")));
    }

    #[test]
    fn test_suspicious_locations() {
        assert!(is_suspicious_location(Path::new("/tmp/x.dump")));
        assert!(is_suspicious_location(Path::new("/dev/shm/blob")));
        assert!(is_suspicious_location(Path::new("/home/alice/exports/crm.sql")));
        assert!(!is_suspicious_location(Path::new("/home/alice/notes.txt")));
        assert!(!is_suspicious_location(Path::new("/srv/backups/crm.sql")));
        // nested directories that merely share the name
        assert!(!is_suspicious_location(Path::new("/srv/app/tmp/x.sql")));
        assert!(!is_suspicious_location(Path::new("/mnt/home/alice/crm.sql")));
    }

    #[test]
    fn test_ignored_paths() {
        assert!(is_ignored_path(Path::new("/proc/self/status")));
        assert!(is_ignored_path(Path::new("/dev/null")));
        assert!(!is_ignored_path(Path::new("/devices/out.sql")));
    }

    #[test]
    fn test_summary() {
        let files = vec![
            OutputFile {
                path: PathBuf::from("/tmp/a.sql"),
                size: 10,
            },
            OutputFile {
                path: PathBuf::from("/srv/b.dump"),
                size: 200,
            },
        ];
        let summary = FileAnalysis::summarize(&files, 100);
        assert_eq!(summary.total_output_files, 2);
        assert_eq!(summary.total_output_bytes, 210);
        assert_eq!(summary.large_dump_files, 1);
        assert_eq!(summary.suspicious_locations, 1);
    }
}
