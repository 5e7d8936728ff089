// pgdump-core/src/ports/journal.rs

use crate::domain::alert::SecurityAlert;
use crate::error::MonitorError;

pub trait AlertJournal: Send + Sync {
    fn record(&self, alert: &SecurityAlert) -> Result<(), MonitorError>;
}
