// pgdump-core/src/domain/metrics.rs

use crate::domain::error::DomainError;
use std::fmt::Write;

/// One line of Prometheus text exposition.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
    pub timestamp_ms: i64,
}

impl MetricSample {
    pub fn new(name: impl Into<String>, value: f64, timestamp_ms: i64) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            value,
            timestamp_ms,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self
    }

    pub fn render(&self) -> Result<String, DomainError> {
        if !is_valid_name(&self.name) {
            return Err(DomainError::MalformedMetric(format!(
                "invalid metric name '{}'",
                self.name
            )));
        }
        if !self.value.is_finite() {
            return Err(DomainError::MalformedMetric(format!(
                "{} has non-finite value",
                self.name
            )));
        }

        let mut line = self.name.clone();
        if !self.labels.is_empty() {
            line.push('{');
            for (i, (key, value)) in self.labels.iter().enumerate() {
                if !is_valid_name(key) || key.contains(':') {
                    return Err(DomainError::MalformedMetric(format!(
                        "invalid label name '{}'",
                        key
                    )));
                }
                if i > 0 {
                    line.push(',');
                }
                let _ = write!(line, "{}=\"{}\"", key, escape_label_value(value));
            }
            line.push('}');
        }
        let _ = write!(line, " {} {}", self.value, self.timestamp_ms);
        Ok(line)
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

pub fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Current monitor state as pushed to VictoriaMetrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStatus {
    pub alert_active: bool,
    pub suspicious_processes: usize,
    /// Seconds since the Unix epoch.
    pub last_scan: i64,
}

/// Builds the push body for one status report.
pub struct MetricsReport<'a> {
    pub prefix: &'a str,
    pub host: &'a str,
}

impl MetricsReport<'_> {
    pub fn samples(&self, status: &MonitorStatus, timestamp_ms: i64) -> Vec<MetricSample> {
        let metric = |suffix: &str, value: f64| {
            MetricSample::new(format!("{}_{}", self.prefix, suffix), value, timestamp_ms)
                .with_label("host", self.host)
        };
        vec![
            metric("alert_active", if status.alert_active { 1.0 } else { 0.0 }),
            metric("last_scan_time", status.last_scan as f64),
            metric("suspicious_processes", status.suspicious_processes as f64),
        ]
    }

    pub fn render(&self, status: &MonitorStatus, timestamp_ms: i64) -> Result<String, DomainError> {
        let mut body = String::new();
        for sample in self.samples(status, timestamp_ms) {
            body.push_str(&sample.render()?);
            body.push('\n');
        }
        Ok(body)
    }
}

/// Remembers the last pushed alert state so transitions can be pushed immediately.
#[derive(Debug, Default)]
pub struct AlertStateTracker {
    last: Option<bool>,
}

impl AlertStateTracker {
    /// True when `active` differs from the previously observed state.
    /// The very first observation counts as a change.
    pub fn observe(&mut self, active: bool) -> bool {
        let changed = self.last != Some(active);
        self.last = Some(active);
        changed
    }

    pub fn current(&self) -> bool {
        self.last.unwrap_or(false)
    }
}
