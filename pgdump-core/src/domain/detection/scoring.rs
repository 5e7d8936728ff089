// pgdump-core/src/domain/detection/scoring.rs

use crate::domain::configuration::{DetectionConfig, ScoreWeights};
use crate::domain::detection::heuristics::HeuristicAnalysis;
use crate::domain::detection::syscall::SystemCallProfile;
use crate::domain::units::format_bytes;
use serde::Serialize;
use std::fmt;

const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    #[default]
    Benign,
    Suspicious,
    Block,
}

impl Verdict {
    pub fn is_alerting(&self) -> bool {
        *self >= Verdict::Suspicious
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::Benign => "benign",
            Verdict::Suspicious => "suspicious",
            Verdict::Block => "block",
        };
        f.write_str(label)
    }
}

/// Everything gathered about one process during a scan.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    pub pattern_score: usize,
    pub matched_binary: Option<String>,
    pub likely_renamed: bool,
    pub postgres_connections: usize,
    pub external_connections: usize,
    pub open_file_bytes: u64,
    pub dump_files: usize,
    pub suspicious_locations: usize,
    pub output_to_file: bool,
    pub output_to_remote: bool,
    pub all_databases: bool,
    pub heuristics: HeuristicAnalysis,
    pub syscalls: Option<SystemCallProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub score: u8,
    pub reasons: Vec<String>,
    pub verdict: Verdict,
}

pub struct SuspicionScorer {
    weights: ScoreWeights,
    min_pattern_matches: usize,
    data_threshold_bytes: u64,
    suspicion_threshold: u8,
    block_threshold: u8,
}

impl SuspicionScorer {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            weights: config.weights,
            min_pattern_matches: config.min_pattern_matches,
            data_threshold_bytes: config.data_threshold_bytes,
            suspicion_threshold: config.suspicion_threshold,
            block_threshold: config.block_threshold,
        }
    }

    pub fn assess(&self, evidence: &Evidence) -> Assessment {
        let mut score: u32 = 0;
        let mut reasons = Vec::new();

        // Identity counts once, whichever way it was established.
        let pattern_identity = evidence.pattern_score >= self.min_pattern_matches;
        if let Some(path) = &evidence.matched_binary {
            score += u32::from(self.weights.identity);
            reasons.push(format!("Known pg_dump binary ({})", path));
            if pattern_identity {
                reasons.push(pattern_reason(evidence.pattern_score));
            }
        } else if pattern_identity {
            score += u32::from(self.weights.identity);
            reasons.push(pattern_reason(evidence.pattern_score));
        }
        if evidence.likely_renamed {
            reasons.push("Renamed binary carrying pg_dump arguments".to_string());
        }
        if evidence.all_databases {
            reasons.push("Dumping all databases".to_string());
        }

        if evidence.postgres_connections > 0 {
            score += u32::from(self.weights.network);
            reasons.push(format!(
                "PostgreSQL database connections ({} connections)",
                evidence.postgres_connections
            ));
        }
        if evidence.external_connections > 0 {
            reasons.push(format!(
                "External connections ({} connections)",
                evidence.external_connections
            ));
        }

        if evidence.open_file_bytes > self.data_threshold_bytes {
            score += u32::from(self.weights.io);
            reasons.push(format!(
                "Large file I/O operations ({})",
                format_bytes(evidence.open_file_bytes)
            ));
        }

        // A remote pipe is an output file that never touches the disk.
        if evidence.dump_files > 0 || evidence.output_to_remote {
            score += u32::from(self.weights.files);
        }
        if evidence.dump_files > 0 {
            reasons.push(format!(
                "Creating dump-like files ({} files)",
                evidence.dump_files
            ));
        } else if evidence.output_to_file && !evidence.output_to_remote {
            reasons.push("Output to file specified in arguments".to_string());
        }
        if evidence.output_to_remote {
            reasons.push("Output piped to remote host".to_string());
        }
        if evidence.suspicious_locations > 0 {
            reasons.push(format!(
                "Writing to suspicious location ({} files)",
                evidence.suspicious_locations
            ));
        }

        let h = &evidence.heuristics;
        if h.is_weighted() {
            score += u32::from(self.weights.heuristics);
        }
        if h.high_io_rate {
            reasons.push(format!(
                "High I/O rate ({}/s)",
                format_bytes(h.io_rate_bytes_per_sec)
            ));
        }
        if h.short_lived {
            reasons.push("Short-lived process".to_string());
        }
        if h.unusual_hours {
            reasons.push("Unusual execution time".to_string());
        }

        if let Some(profile) = &evidence.syscalls {
            score += u32::from(profile.score());
            reasons.extend(profile.reasons());
        }

        let score = score.min(MAX_SCORE) as u8;
        Assessment {
            score,
            reasons,
            verdict: self.verdict(score),
        }
    }

    pub fn verdict(&self, score: u8) -> Verdict {
        if score >= self.block_threshold {
            Verdict::Block
        } else if score >= self.suspicion_threshold {
            Verdict::Suspicious
        } else {
            Verdict::Benign
        }
    }
}

fn pattern_reason(count: usize) -> String {
    format!("High pg_dump argument pattern match ({} patterns)", count)
}
