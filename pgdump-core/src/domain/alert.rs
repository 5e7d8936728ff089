// pgdump-core/src/domain/alert.rs

use crate::domain::detection::scoring::{Assessment, Verdict};
use crate::domain::process::{NetworkConnection, OutputFile, ProcessSnapshot};
use crate::domain::units::format_bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const ALERT_TYPE: &str = "SUSPICIOUS_PGDUMP_PROCESS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    High,
    Critical,
}

impl AlertSeverity {
    pub fn for_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Block => AlertSeverity::Critical,
            _ => AlertSeverity::High,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::High => f.write_str("HIGH"),
            AlertSeverity::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// Serialized as one JSON object per journal line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlert {
    pub timestamp: DateTime<Utc>,
    pub alert_type: &'static str,
    pub severity: AlertSeverity,
    pub process_id: u32,
    pub command: String,
    pub arguments: String,
    pub user: String,
    pub suspicion_score: u8,
    pub reasons: Vec<String>,
    pub network_connections: Vec<NetworkConnection>,
    pub output_files: Vec<OutputFile>,
    pub blocked: bool,
    pub host: String,
}

impl SecurityAlert {
    pub fn new(
        process: &ProcessSnapshot,
        assessment: &Assessment,
        connections: Vec<NetworkConnection>,
        output_files: Vec<OutputFile>,
        host: &str,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            alert_type: ALERT_TYPE,
            severity: AlertSeverity::for_verdict(assessment.verdict),
            process_id: process.pid,
            command: process.command(),
            arguments: process.arguments(),
            user: process.user.clone(),
            suspicion_score: assessment.score,
            reasons: assessment.reasons.clone(),
            network_connections: connections,
            output_files,
            blocked: false,
            host: host.to_string(),
        }
    }
}

/// Multi-line block written to the log.
impl fmt::Display for SecurityAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SECURITY ALERT: suspicious pg_dump-like process detected")?;
        writeln!(f, "  - Type: {}", self.alert_type)?;
        writeln!(f, "  - Severity: {}", self.severity)?;
        writeln!(f, "  - Host: {}", self.host)?;
        writeln!(f, "  - Process ID: {}", self.process_id)?;
        writeln!(f, "  - User: {}", self.user)?;
        writeln!(f, "  - Command: {} {}", self.command, self.arguments)?;
        writeln!(f, "  - Suspicion Score: {}%", self.suspicion_score)?;
        writeln!(f, "  - Blocked: {}", self.blocked)?;

        if !self.reasons.is_empty() {
            writeln!(f, "  Reasons:")?;
            for reason in &self.reasons {
                writeln!(f, "    * {}", reason)?;
            }
        }
        if !self.network_connections.is_empty() {
            writeln!(f, "  Network Connections:")?;
            for conn in &self.network_connections {
                writeln!(f, "    * {}", conn)?;
            }
        }
        if !self.output_files.is_empty() {
            writeln!(f, "  Output Files:")?;
            for file in &self.output_files {
                writeln!(f, "    * {} ({})", file.path.display(), format_bytes(file.size))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::process::TcpState;
    use anyhow::Result;
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;

    fn sample() -> SecurityAlert {
        let process = ProcessSnapshot {
            pid: 4242,
            start_time: 1_700_000_000,
            exe: Some(PathBuf::from("/usr/bin/pg_dump")),
            name: "pg_dump".to_string(),
            args: vec!["pg_dump".to_string(), "-h".to_string(), "10.0.1.10".to_string()],
            user: "postgres".to_string(),
            ..Default::default()
        };
        let assessment = Assessment {
            score: 85,
            reasons: vec!["Known pg_dump binary (pg_dump)".to_string()],
            verdict: Verdict::Block,
        };
        let conn = NetworkConnection {
            local_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            local_port: 50122,
            remote_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 1, 10)),
            remote_port: 5432,
            state: TcpState::Established,
        };
        let file = OutputFile {
            path: PathBuf::from("/tmp/crm.dump"),
            size: 2048,
        };
        SecurityAlert::new(&process, &assessment, vec![conn], vec![file], "db-bastion")
    }

    #[test]
    fn test_severity_follows_verdict() {
        assert_eq!(AlertSeverity::for_verdict(Verdict::Suspicious), AlertSeverity::High);
        assert_eq!(sample().severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_json_shape() -> Result<()> {
        let value = serde_json::to_value(sample())?;
        assert_eq!(value["alertType"], "SUSPICIOUS_PGDUMP_PROCESS");
        assert_eq!(value["severity"], "CRITICAL");
        assert_eq!(value["processId"], 4242);
        assert_eq!(value["command"], "/usr/bin/pg_dump");
        assert_eq!(value["arguments"], "-h 10.0.1.10");
        assert_eq!(value["suspicionScore"], 85);
        assert_eq!(value["blocked"], false);
        assert_eq!(value["networkConnections"][0]["remotePort"], 5432);
        assert!(value["networkConnections"][0].get("remote_port").is_none());
        Ok(())
    }

    #[test]
    fn test_display_block() {
        let text = sample().to_string();
        assert!(text.contains("  - Suspicion Score: 85%"));
        assert!(text.contains("    * 10.0.0.2:50122 -> 10.0.1.10:5432 [ESTABLISHED]"));
        assert!(text.contains("    * /tmp/crm.dump (2.00 KB)"));
    }
}
