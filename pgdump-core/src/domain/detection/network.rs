// pgdump-core/src/domain/detection/network.rs

use crate::domain::configuration::PostgresConfig;
use crate::domain::process::{NetworkConnection, TcpState};
use serde::Serialize;
use std::collections::HashSet;
use std::net::IpAddr;

/// Known PostgreSQL endpoints (ports + hosts).
#[derive(Debug, Clone)]
pub struct PostgresEndpoints {
    ports: HashSet<u16>,
    hosts: HashSet<String>,
}

impl PostgresEndpoints {
    pub fn new(config: &PostgresConfig) -> Self {
        Self {
            ports: config.ports.iter().copied().collect(),
            hosts: config
                .hosts
                .iter()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Only established sessions count.
    pub fn is_postgres_connection(&self, conn: &NetworkConnection) -> bool {
        if conn.state != TcpState::Established {
            return false;
        }
        if self.ports.contains(&conn.remote_port) {
            return true;
        }
        let remote = canonical(conn.remote_addr);
        self.hosts.contains(&remote.to_string())
            || (remote.is_loopback() && self.hosts.contains("localhost"))
    }
}

/// Unwraps IPv4-mapped IPv6 addresses (`::ffff:10.0.1.10`).
pub fn canonical(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(addr),
        v4 => v4,
    }
}

/// Anything outside loopback, private and link-local ranges.
pub fn is_external(addr: IpAddr) -> bool {
    match canonical(addr) {
        IpAddr::V4(v4) => {
            !(v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified())
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            let unique_local = (first & 0xfe00) == 0xfc00;
            let link_local = (first & 0xffc0) == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkAnalysis {
    pub total_connections: usize,
    pub postgres_connections: usize,
    pub external_connections: usize,
}

impl NetworkAnalysis {
    pub fn summarize(endpoints: &PostgresEndpoints, connections: &[NetworkConnection]) -> Self {
        Self {
            total_connections: connections.len(),
            postgres_connections: connections
                .iter()
                .filter(|c| endpoints.is_postgres_connection(c))
                .count(),
            external_connections: connections
                .iter()
                .filter(|c| is_external(c.remote_addr))
                .count(),
        }
    }
}
