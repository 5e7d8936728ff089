// pgdump-core/src/domain/detection/syscall.rs

use crate::domain::units::{MIB, format_bytes};
use serde::Serialize;

const LARGE_READ: u64 = 10 * MIB;
const LARGE_WRITE: u64 = 5 * MIB;
const MANY_FILE_OPENS: u32 = 10;

/// Aggregate of traced system calls for one process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemCallProfile {
    pub postgres_connects: u32,
    pub read_calls: u32,
    pub write_calls: u32,
    pub file_opens: u32,
    pub database_queries: u32,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

impl SystemCallProfile {
    pub fn from_output(output: &str) -> Self {
        let mut profile = Self::default();
        for line in output.lines() {
            profile.ingest_line(line);
        }
        profile
    }

    pub fn ingest_line(&mut self, line: &str) {
        let Some(name) = syscall_name(line) else {
            return;
        };

        match name {
            "connect" if line.contains("5432") => self.postgres_connects += 1,
            "read" | "pread64" | "readv" | "recv" | "recvfrom" | "recvmsg" => {
                self.read_calls += 1;
                self.bytes_read += return_value(line);
            }
            "write" | "pwrite64" | "writev" | "send" | "sendto" | "sendmsg" => {
                self.write_calls += 1;
                self.bytes_written += return_value(line);
            }
            "open" | "openat" | "openat2" => self.file_opens += 1,
            _ => {}
        }

        if line.contains("COPY") || line.contains("SELECT") || line.contains("pg_dump") {
            self.database_queries += 1;
        }
    }

    pub fn score(&self) -> u8 {
        let mut score: u32 = 0;

        if self.postgres_connects > 0 {
            score += (self.postgres_connects * 25).min(50);
        }
        if self.bytes_read > LARGE_READ {
            score += 20;
        }
        if self.bytes_written > LARGE_WRITE {
            score += 15;
        }
        if self.file_opens > MANY_FILE_OPENS {
            score += 10;
        }
        if self.database_queries > 0 {
            score += (self.database_queries * 5).min(15);
        }

        score.min(100) as u8
    }

    pub fn reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if self.postgres_connects > 0 {
            reasons.push(format!(
                "Direct PostgreSQL connections detected ({} connects)",
                self.postgres_connects
            ));
        }
        if self.bytes_read > LARGE_READ {
            reasons.push(format!(
                "Large data reading activity ({} read)",
                format_bytes(self.bytes_read)
            ));
        }
        if self.bytes_written > LARGE_WRITE {
            reasons.push(format!(
                "Large data writing activity ({} written)",
                format_bytes(self.bytes_written)
            ));
        }
        if self.database_queries > 0 {
            reasons.push(format!(
                "Database query patterns detected ({} queries)",
                self.database_queries
            ));
        }
        reasons
    }
}

/// `[pid  42] openat(...)` -> `openat`.
fn syscall_name(line: &str) -> Option<&str> {
    let head = &line[..line.find('(')?];
    head.split_whitespace().last()
}

/// `syscall(...) = 4096` -> 4096. Errors (`= -1 EAGAIN`) and summaries yield 0.
fn return_value(line: &str) -> u64 {
    line.rfind(" = ")
        .and_then(|pos| line[pos + 3..].split_whitespace().next())
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(0)
}
