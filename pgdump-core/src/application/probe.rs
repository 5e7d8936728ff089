// pgdump-core/src/application/probe.rs

use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::Serialize;
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use crate::domain::configuration::MonitorConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub host: String,
    pub port: u16,
    pub reachable: bool,
    pub latency_ms: Option<u128>,
}

/// TCP reachability of every known PostgreSQL host × port.
pub struct ReachabilityProbe {
    targets: Vec<(String, u16)>,
    timeout: Duration,
}

impl ReachabilityProbe {
    pub fn new(config: &MonitorConfig) -> Self {
        let mut targets = Vec::new();
        for host in &config.postgres.hosts {
            for port in &config.postgres.ports {
                targets.push((host.clone(), *port));
            }
        }
        Self {
            targets,
            timeout: Duration::from_millis(config.network.timeout_ms),
        }
    }

    pub fn targets(&self) -> &[(String, u16)] {
        &self.targets
    }

    #[instrument(skip(self), fields(targets = self.targets.len()))]
    pub async fn run(&self) -> Vec<ProbeResult> {
        let checks = self
            .targets
            .iter()
            .map(|(host, port)| probe_one(host, *port, self.timeout));
        let results = join_all(checks).await;

        for r in &results {
            debug!(
                host = %r.host,
                port = r.port,
                reachable = r.reachable,
                latency_ms = ?r.latency_ms,
                "PostgreSQL endpoint probe"
            );
        }
        results
    }
}

async fn probe_one(host: &str, port: u16, timeout: Duration) -> ProbeResult {
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, TcpStream::connect((host, port))).await;
    let reachable = matches!(outcome, Ok(Ok(_)));
    ProbeResult {
        host: host.to_string(),
        port,
        reachable,
        latency_ms: reachable.then(|| started.elapsed().as_millis()),
    }
}
