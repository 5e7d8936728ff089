// pgdump-core/src/domain/process.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;

/// One process incarnation. A recycled PID with a new start time is a new key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessKey {
    pub pid: u32,
    pub start_time: u64,
}

impl fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pid, self.start_time)
    }
}

/// What the process enumerator reports for a single process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    /// Seconds since the Unix epoch.
    pub start_time: u64,
    pub exe: Option<PathBuf>,
    pub name: String,
    /// Full argv, argv[0] included.
    pub args: Vec<String>,
    pub user: String,
    pub read_bytes: u64,
    pub written_bytes: u64,
}

impl ProcessSnapshot {
    pub fn key(&self) -> ProcessKey {
        ProcessKey {
            pid: self.pid,
            start_time: self.start_time,
        }
    }

    /// Executable path when readable, otherwise the command name.
    pub fn command(&self) -> String {
        match &self.exe {
            Some(path) => path.display().to_string(),
            None => self.name.clone(),
        }
    }

    /// Arguments without argv[0], space-joined.
    pub fn arguments(&self) -> String {
        self.args.iter().skip(1).cloned().collect::<Vec<_>>().join(" ")
    }

    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Kernel TCP states as encoded in /proc/net/tcp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TcpState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    Unknown,
}

impl TcpState {
    pub fn from_hex(code: &str) -> Self {
        match u8::from_str_radix(code.trim(), 16) {
            Ok(0x01) => Self::Established,
            Ok(0x02) => Self::SynSent,
            Ok(0x03) => Self::SynRecv,
            Ok(0x04) => Self::FinWait1,
            Ok(0x05) => Self::FinWait2,
            Ok(0x06) => Self::TimeWait,
            Ok(0x07) => Self::Close,
            Ok(0x08) => Self::CloseWait,
            Ok(0x09) => Self::LastAck,
            Ok(0x0A) => Self::Listen,
            Ok(0x0B) => Self::Closing,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Established => "ESTABLISHED",
            Self::SynSent => "SYN_SENT",
            Self::SynRecv => "SYN_RECV",
            Self::FinWait1 => "FIN_WAIT1",
            Self::FinWait2 => "FIN_WAIT2",
            Self::TimeWait => "TIME_WAIT",
            Self::Close => "CLOSE",
            Self::CloseWait => "CLOSE_WAIT",
            Self::LastAck => "LAST_ACK",
            Self::Listen => "LISTEN",
            Self::Closing => "CLOSING",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConnection {
    pub local_addr: IpAddr,
    pub local_port: u16,
    pub remote_addr: IpAddr,
    pub remote_port: u16,
    pub state: TcpState,
}

impl fmt::Display for NetworkConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} [{}]",
            self.local_addr, self.local_port, self.remote_addr, self.remote_port, self.state
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFile {
    pub path: PathBuf,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_tcp_state_decoding() {
        assert_eq!(TcpState::from_hex("01"), TcpState::Established);
        assert_eq!(TcpState::from_hex("0A"), TcpState::Listen);
        assert_eq!(TcpState::from_hex("zz"), TcpState::Unknown);
    }

    #[test]
    fn test_connection_display() {
        let conn = NetworkConnection {
            local_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            local_port: 40112,
            remote_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 1, 10)),
            remote_port: 5432,
            state: TcpState::Established,
        };
        assert_eq!(
            conn.to_string(),
            "10.0.0.2:40112 -> 10.0.1.10:5432 [ESTABLISHED]"
        );
    }

    #[test]
    fn test_snapshot_arguments_skip_argv0() {
        let snap = ProcessSnapshot {
            pid: 42,
            name: "pg_dump".to_string(),
            args: vec![
                "/usr/bin/pg_dump".to_string(),
                "-h".to_string(),
                "10.0.1.10".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(snap.arguments(), "-h 10.0.1.10");
        assert_eq!(snap.command(), "pg_dump");
        assert_eq!(snap.command_line(), "/usr/bin/pg_dump -h 10.0.1.10");
    }
}
