// pgdump-core/src/infrastructure/adapters/alert_journal.rs

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use tracing::debug;

use crate::domain::alert::SecurityAlert;
use crate::error::MonitorError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::AlertJournal;

/// Appends alerts as JSON lines to `security_alerts_<YYYY-MM-DD>.log`.
pub struct JsonLinesJournal {
    directory: PathBuf,
}

impl JsonLinesJournal {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Local calendar day of the alert.
    pub fn path_for(&self, timestamp: DateTime<Utc>) -> PathBuf {
        let day = timestamp.with_timezone(&Local).format("%Y-%m-%d");
        self.directory.join(format!("security_alerts_{}.log", day))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl AlertJournal for JsonLinesJournal {
    fn record(&self, alert: &SecurityAlert) -> Result<(), MonitorError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.path_for(alert.timestamp);

        let mut line = serde_json::to_string(alert).map_err(InfrastructureError::from)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        debug!(path = ?path, pid = alert.process_id, "Alert journaled");
        Ok(())
    }
}

/// Used when `alerts.journal_enabled` is false.
pub struct DisabledJournal;

impl AlertJournal for DisabledJournal {
    fn record(&self, _alert: &SecurityAlert) -> Result<(), MonitorError> {
        Ok(())
    }
}
