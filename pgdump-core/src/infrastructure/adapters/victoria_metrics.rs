// pgdump-core/src/infrastructure/adapters/victoria_metrics.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::domain::configuration::MetricsConfig;
use crate::error::MonitorError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::MetricsSink;

/// Pushes Prometheus text to a VictoriaMetrics import endpoint.
pub struct VictoriaMetricsSink {
    client: reqwest::Client,
    url: String,
    username: Option<String>,
    password: Option<String>,
}

impl VictoriaMetricsSink {
    pub fn new(config: &MetricsConfig) -> Result<Self, InfrastructureError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl MetricsSink for VictoriaMetricsSink {
    async fn push(&self, body: &str) -> Result<(), MonitorError> {
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body.to_string());
        request = match (&self.username, &self.password) {
            (Some(user), pass) => request.basic_auth(user, pass.as_ref()),
            (None, _) => request,
        };

        let response = request.send().await.map_err(InfrastructureError::from)?;
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            debug!(status = status.as_u16(), "Metrics pushed");
            Ok(())
        } else {
            Err(InfrastructureError::MetricsRejected {
                status: status.as_u16(),
            }
            .into())
        }
    }
}

/// Used when `metrics.enabled` is false.
pub struct NoopMetricsSink;

#[async_trait]
impl MetricsSink for NoopMetricsSink {
    async fn push(&self, _body: &str) -> Result<(), MonitorError> {
        Ok(())
    }
}
