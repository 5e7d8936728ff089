// pgdump-core/src/domain/detection/binary.rs

use crate::domain::process::ProcessSnapshot;

/// Matches processes launched from a known pg_dump location.
#[derive(Debug, Clone)]
pub struct BinaryMatcher {
    known_paths: Vec<String>,
}

impl BinaryMatcher {
    pub fn new(known_paths: &[String]) -> Self {
        Self {
            known_paths: known_paths
                .iter()
                .filter(|p| !p.trim().is_empty())
                .cloned()
                .collect(),
        }
    }

    /// Returns the first known location found in the executable path,
    /// the command name or argv[0].
    pub fn matched_path(&self, process: &ProcessSnapshot) -> Option<&str> {
        let exe = process
            .exe
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let argv0 = process.args.first().map(String::as_str).unwrap_or("");

        self.known_paths
            .iter()
            .find(|known| {
                let known = known.as_str();
                exe.contains(known) || process.name.contains(known) || argv0.contains(known)
            })
            .map(String::as_str)
    }

    pub fn is_match(&self, process: &ProcessSnapshot) -> bool {
        self.matched_path(process).is_some()
    }
}
