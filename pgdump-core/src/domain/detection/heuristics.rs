// pgdump-core/src/domain/detection/heuristics.rs

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeuristicAnalysis {
    pub io_rate_bytes_per_sec: u64,
    pub high_io_rate: bool,
    pub short_lived: bool,
    /// 00:00-05:59 local time.
    pub unusual_hours: bool,
}

pub struct HeuristicInput {
    pub start_time: u64,
    pub now: u64,
    pub local_hour: u32,
    pub output_bytes: u64,
}

impl HeuristicAnalysis {
    pub fn evaluate(input: &HeuristicInput, io_rate_threshold: u64, short_lived_secs: u64) -> Self {
        // start_time == 0 means the enumerator could not tell
        let age = if input.start_time > 0 {
            Some(input.now.saturating_sub(input.start_time))
        } else {
            None
        };

        let io_rate = match age {
            Some(secs) if secs > 0 => input.output_bytes / secs,
            _ => 0,
        };

        Self {
            io_rate_bytes_per_sec: io_rate,
            high_io_rate: io_rate > io_rate_threshold,
            short_lived: age.is_some_and(|secs| secs < short_lived_secs),
            unusual_hours: input.local_hour <= 5,
        }
    }

    /// Signals that carry score weight.
    pub fn is_weighted(&self) -> bool {
        self.high_io_rate || self.short_lived
    }
}
