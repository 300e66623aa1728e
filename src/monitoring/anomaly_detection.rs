use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::OrchestratorResult;
use crate::monitoring::history::HistoryBuffer;

/// Samples required before the anomaly provider is consulted.
pub const DEFAULT_WARMUP_SAMPLES: usize = 5;

/// Body sent to the anomaly provider. Both arrays have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectRequest {
    pub cpu_values: Vec<f32>,
    pub memory_values: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyVerdict {
    pub cpu_anomaly: bool,
    pub memory_anomaly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_score: Option<f32>,
}

impl AnomalyVerdict {
    /// "Nothing flagged", used during warm-up and when detection is unavailable.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.cpu_anomaly || self.memory_anomaly
    }
}

#[async_trait]
pub trait AnomalyProvider: Send + Sync {
    async fn detect(&self, request: &DetectRequest) -> OrchestratorResult<AnomalyVerdict>;
}

pub struct AnomalyChecker {
    provider: Arc<dyn AnomalyProvider>,
    history: Arc<HistoryBuffer>,
    warmup_samples: usize,
}

impl AnomalyChecker {
    pub fn new(
        provider: Arc<dyn AnomalyProvider>,
        history: Arc<HistoryBuffer>,
        warmup_samples: usize,
    ) -> Self {
        Self {
            provider,
            history,
            warmup_samples,
        }
    }

    /// Submits the current history to the provider, or returns a neutral
    /// verdict without any network call while history is still warming up.
    pub async fn check(&self) -> OrchestratorResult<AnomalyVerdict> {
        let snapshot = self.history.snapshot().await;

        if snapshot.len() < self.warmup_samples {
            debug!(
                samples = snapshot.len(),
                required = self.warmup_samples,
                "Not enough history for anomaly detection yet"
            );
            return Ok(AnomalyVerdict::neutral());
        }

        let request = DetectRequest {
            cpu_values: snapshot.cpu,
            memory_values: snapshot.memory,
        };
        let verdict = self.provider.detect(&request).await?;

        if verdict.any() {
            info!(
                cpu_score = ?verdict.cpu_score,
                memory_score = ?verdict.memory_score,
                "Anomaly detected - CPU: {} Memory: {}",
                verdict.cpu_anomaly,
                verdict.memory_anomaly
            );
        }

        Ok(verdict)
    }
}
