//! reqwest-backed providers for the metrics and anomaly services.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::errors::{OrchestratorError, OrchestratorResult, Upstream};
use crate::monitoring::anomaly_detection::{AnomalyProvider, AnomalyVerdict, DetectRequest};
use crate::monitoring::metrics::{MetricsProvider, SystemSnapshot};

/// Fixed per-call timeout for both providers.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared client for both providers; the timeout covers connect, send and body read.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

/// Maps a provider response onto the error taxonomy and decodes the body.
async fn read_json<T: DeserializeOwned>(
    upstream: Upstream,
    response: Response,
) -> OrchestratorResult<T> {
    let status = response.status();
    if status != StatusCode::OK {
        // The body is diagnostic only, so an unreadable one is not fatal here.
        let body = response.text().await.unwrap_or_default();
        return Err(OrchestratorError::Upstream {
            upstream,
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| OrchestratorError::transport(upstream, e))?;

    serde_json::from_slice(&bytes).map_err(|source| OrchestratorError::Decode { upstream, source })
}

#[derive(Debug, Clone)]
pub struct HttpMetricsProvider {
    client: Client,
    url: String,
}

impl HttpMetricsProvider {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MetricsProvider for HttpMetricsProvider {
    async fn fetch_snapshot(&self) -> OrchestratorResult<SystemSnapshot> {
        debug!(url = %self.url, "Polling metrics provider");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| OrchestratorError::transport(Upstream::Metrics, e))?;

        read_json(Upstream::Metrics, response).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpAnomalyProvider {
    client: Client,
    url: String,
}

impl HttpAnomalyProvider {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl AnomalyProvider for HttpAnomalyProvider {
    async fn detect(&self, request: &DetectRequest) -> OrchestratorResult<AnomalyVerdict> {
        debug!(
            url = %self.url,
            samples = request.cpu_values.len(),
            "Submitting history for detection"
        );
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| OrchestratorError::transport(Upstream::Anomaly, e))?;

        read_json(Upstream::Anomaly, response).await
    }
}
